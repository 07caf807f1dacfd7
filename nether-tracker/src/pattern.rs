//! Pattern and note data structures

use crate::effects::{TrackerEffect, VolumeEffect};

/// Tracker pattern
#[derive(Debug, Clone)]
pub struct TrackerPattern {
    /// Number of rows (1-256)
    pub num_rows: u16,
    /// Note data: [row][channel]
    pub notes: Vec<Vec<TrackerNote>>,
}

impl TrackerPattern {
    /// Get note at specific row and channel
    pub fn get_note(&self, row: u16, channel: u8) -> Option<&TrackerNote> {
        self.notes.get(row as usize)?.get(channel as usize)
    }

    /// Create an empty pattern
    pub fn empty(num_rows: u16, num_channels: u8) -> Self {
        let notes = (0..num_rows)
            .map(|_| vec![TrackerNote::default(); num_channels as usize])
            .collect();
        Self { num_rows, notes }
    }
}

/// Single note/command in a pattern
///
/// The five raw cell bytes are kept next to the decoded effects so the cell
/// can be displayed the way the tracker showed it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerNote {
    /// Note value (0 = none, 1-96 = C-0 to B-7, 254 = cut, 255 = off)
    pub note: u8,
    /// Instrument number (1-based, 0 = none)
    pub instrument: u8,
    /// Raw volume column byte (XM encoding, 0 = empty)
    pub volume: u8,
    /// Raw effect command (0x00-0x21)
    pub effect_cmd: u8,
    /// Raw effect parameter
    pub effect_param: u8,
    /// Decoded effect column
    pub effect: TrackerEffect,
    /// Decoded volume column
    pub vol_effect: VolumeEffect,
}

impl TrackerNote {
    pub const NOTE_CUT: u8 = 254;
    pub const NOTE_OFF: u8 = 255;
    pub const NOTE_MAX: u8 = 96;

    /// Check if this is a note-cut
    pub fn is_note_cut(&self) -> bool {
        self.note == Self::NOTE_CUT
    }

    /// Check if this is a note-off
    pub fn is_note_off(&self) -> bool {
        self.note == Self::NOTE_OFF
    }

    /// Check if this has a valid note (0 = no note)
    pub fn has_note(&self) -> bool {
        self.note > 0 && self.note <= Self::NOTE_MAX
    }

    /// Check if this has an instrument
    pub fn has_instrument(&self) -> bool {
        self.instrument > 0
    }

    /// Check if there's an effect
    pub fn has_effect(&self) -> bool {
        !matches!(self.effect, TrackerEffect::None)
    }

    /// Check if every column is empty
    pub fn is_empty(&self) -> bool {
        self.note == 0
            && self.instrument == 0
            && self.volume == 0
            && self.effect_cmd == 0
            && self.effect_param == 0
    }

    /// Note name such as `C-4`, `===` for note-off and `^^^` for note-cut
    pub fn note_name(&self) -> String {
        const NAMES: [&str; 12] = [
            "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
        ];
        match self.note {
            0 => "...".to_string(),
            Self::NOTE_OFF => "===".to_string(),
            Self::NOTE_CUT => "^^^".to_string(),
            n if n <= Self::NOTE_MAX => {
                let n = n - 1;
                format!("{}{}", NAMES[(n % 12) as usize], n / 12)
            }
            _ => "???".to_string(),
        }
    }
}
