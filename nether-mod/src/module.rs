//! MOD module data structures

use crate::{ROWS_PER_PATTERN, period_to_note};

/// Parsed MOD module
#[derive(Debug, Clone, Default)]
pub struct ModModule {
    /// Song title (max 20 chars)
    pub title: String,
    /// Format tag found at offset 1080
    pub tag: [u8; 4],
    /// Channel count implied by the tag
    pub num_channels: u8,
    /// The 31 sample slots (empty slots have no data)
    pub samples: Vec<ModSample>,
    /// Restart position byte (127 in most ProTracker files)
    pub restart_position: u8,
    /// Played part of the order table (`song_length` entries)
    pub order_table: Vec<u8>,
    /// Pattern data
    pub patterns: Vec<ModPattern>,
    /// Recoverable problems found while parsing
    pub warnings: Vec<String>,
}

impl ModModule {
    /// Format tag as text
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }

    /// Number of played order entries
    pub fn song_length(&self) -> usize {
        self.order_table.len()
    }

    /// Get the pattern at the given order position
    pub fn pattern_at_order(&self, order: usize) -> Option<&ModPattern> {
        let pattern_idx = *self.order_table.get(order)? as usize;
        self.patterns.get(pattern_idx)
    }
}

/// One sample slot
#[derive(Debug, Clone, Default)]
pub struct ModSample {
    /// Sample name (22 chars, often used for song text)
    pub name: String,
    /// Finetune in 1/8 semitones (-8..=7)
    pub finetune: i8,
    /// Default volume (0-64)
    pub volume: u8,
    /// Loop start in frames
    pub loop_start: u32,
    /// Loop length in frames (2 or less means no loop)
    pub loop_length: u32,
    /// PCM data widened from signed 8-bit
    pub data: Vec<i16>,
}

impl ModSample {
    #[inline]
    pub fn has_loop(&self) -> bool {
        self.loop_length > 2
    }

    #[inline]
    pub fn loop_end(&self) -> u32 {
        self.loop_start + self.loop_length
    }
}

/// A 64-row pattern
#[derive(Debug, Clone)]
pub struct ModPattern {
    /// Cells: [row][channel]
    pub rows: Vec<Vec<ModNote>>,
}

impl ModPattern {
    /// Create an empty pattern
    pub fn empty(num_channels: u8) -> Self {
        Self {
            rows: (0..ROWS_PER_PATTERN)
                .map(|_| vec![ModNote::default(); num_channels as usize])
                .collect(),
        }
    }

    pub fn get_note(&self, row: u16, channel: u8) -> Option<&ModNote> {
        self.rows.get(row as usize)?.get(channel as usize)
    }
}

/// A single cell as stored in the file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModNote {
    /// Amiga period (0 = no note)
    pub period: u16,
    /// Sample number (1-31, 0 = none)
    pub sample: u8,
    /// Effect command (0x0-0xF)
    pub effect: u8,
    /// Effect parameter
    pub param: u8,
}

impl ModNote {
    /// Note number for the period (XM numbering, 0 = none)
    pub fn note(&self) -> u8 {
        period_to_note(self.period)
    }

    /// Decode the 4-byte on-disk cell
    pub fn from_bytes(b: [u8; 4]) -> Self {
        Self {
            period: (((b[0] & 0x0F) as u16) << 8) | b[1] as u16,
            sample: (b[0] & 0xF0) | (b[2] >> 4),
            effect: b[2] & 0x0F,
            param: b[3],
        }
    }

    /// Encode to the 4-byte on-disk cell
    pub fn to_bytes(&self) -> [u8; 4] {
        [
            (self.sample & 0xF0) | ((self.period >> 8) as u8 & 0x0F),
            self.period as u8,
            (self.sample << 4) | (self.effect & 0x0F),
            self.param,
        ]
    }
}
