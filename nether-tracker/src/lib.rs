//! Nether-Tracker: unified tracker module model for Nether ModPlay
//!
//! This crate provides format-agnostic tracker types that both XM and MOD
//! modules are converted to, so the playback engine handles every supported
//! format with a single implementation.
//!
//! # Design
//!
//! The unified model normalizes differences between the formats:
//! - Notes use the XM numbering (1 = C-0, 49 = C-4, 96 = B-7)
//! - Effects are decoded once into [`TrackerEffect`] / [`VolumeEffect`]
//! - Samples live in one flat list; instruments map notes into it
//! - The order list uses [`OrderEntry`] instead of raw bytes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │  MOD File (.mod) │     │  XM File (.xm)   │
//! └────────┬─────────┘     └────────┬─────────┘
//!          │                        │
//!     parse_mod()              parse_xm()
//!          │                        │
//!          ▼                        ▼
//!     ┌────────────────────────────────────────┐
//!     │         TrackerModule (unified)        │
//!     │  - orders: Vec<OrderEntry>             │
//!     │  - patterns: Vec<TrackerPattern>       │
//!     │  - instruments: Vec<TrackerInstrument> │
//!     │  - samples: Vec<TrackerSample>         │
//!     │  - format: FormatFlags                 │
//!     └────────────────────────────────────────┘
//!                      │
//!                      ▼
//!                   Player
//!         (plays any TrackerModule)
//! ```

mod convert_mod;
mod convert_xm;
mod converter;
mod effects;
mod instrument;
mod pattern;
mod sample;

pub use convert_mod::{from_mod_module, tracker_name_for_tag};
pub use convert_xm::from_xm_module;
pub use converter::{ModConverter, ModuleConverter, XmConverter};
pub use effects::{TrackerEffect, VolumeEffect};
pub use instrument::{EnvelopeFlags, TrackerEnvelope, TrackerInstrument};
pub use pattern::{TrackerNote, TrackerPattern};
pub use sample::{LoopType, TrackerSample};

/// Number of playable notes (C-0 to B-7)
pub const NUM_NOTES: usize = 96;

/// Center position on the 0-255 panning scale
pub const PAN_CENTER: u8 = 128;

// =============================================================================
// Unified Tracker Module
// =============================================================================

/// Unified tracker module format (agnostic to XM/MOD origin)
#[derive(Debug, Clone)]
pub struct TrackerModule {
    /// Module name
    pub name: String,
    /// Format the module was loaded from
    pub source: SourceFormat,
    /// Tracker that wrote the file, as far as it can be told
    pub tracker: String,
    /// Number of channels used (1-32)
    pub num_channels: u8,
    /// Initial speed (ticks per row)
    pub initial_speed: u8,
    /// Initial tempo (BPM)
    pub initial_tempo: u8,
    /// Initial global volume (0-64)
    pub global_volume: u8,
    /// Order list
    pub orders: Vec<OrderEntry>,
    /// Order index playback restarts from after the last order
    pub restart_position: u16,
    /// Pattern data
    pub patterns: Vec<TrackerPattern>,
    /// Instrument definitions (note numbers in cells are 1-based into this)
    pub instruments: Vec<TrackerInstrument>,
    /// Every sample in the module; instruments refer to these by index
    pub samples: Vec<TrackerSample>,
    /// Initial panning per channel (0 = left, 128 = center, 255 = right)
    pub channel_panning: Vec<u8>,
    /// Format-specific flags
    pub format: FormatFlags,
    /// Song message (trackers of this era keep prose in instrument names)
    pub message: Option<String>,
    /// Recoverable problems found while loading or converting
    pub warnings: Vec<String>,
}

impl Default for TrackerModule {
    fn default() -> Self {
        Self {
            name: String::new(),
            source: SourceFormat::Xm,
            tracker: String::new(),
            num_channels: 4,
            initial_speed: 6,
            initial_tempo: 125,
            global_volume: 64,
            orders: Vec::new(),
            restart_position: 0,
            patterns: Vec::new(),
            instruments: Vec::new(),
            samples: Vec::new(),
            channel_panning: vec![PAN_CENTER; 4],
            format: FormatFlags::empty(),
            message: None,
            warnings: Vec::new(),
        }
    }
}

impl TrackerModule {
    /// Get the order entry at the given position
    pub fn order(&self, order: u16) -> Option<OrderEntry> {
        self.orders.get(order as usize).copied()
    }

    /// Get the pattern played at the given order position
    ///
    /// Returns `None` for out-of-range orders and for skip/end markers.
    pub fn pattern_at_order(&self, order: u16) -> Option<&TrackerPattern> {
        match self.order(order)? {
            OrderEntry::Pattern(index) => self.patterns.get(index as usize),
            OrderEntry::Skip | OrderEntry::End => None,
        }
    }

    /// Get an instrument by its 1-based cell number
    pub fn instrument(&self, number: u8) -> Option<&TrackerInstrument> {
        self.instruments.get((number as usize).checked_sub(1)?)
    }

    /// Resolve the sample an instrument plays for a note
    pub fn sample_for(&self, instrument: u8, note: u8) -> Option<&TrackerSample> {
        let index = self.instrument(instrument)?.sample_for_note(note)?;
        self.samples.get(index as usize)
    }

    /// Check if linear frequency slides are used (vs Amiga periods)
    pub fn uses_linear_slides(&self) -> bool {
        self.format.contains(FormatFlags::LINEAR_SLIDES)
    }

    /// Check if this module has real instruments (vs one per sample)
    pub fn uses_instruments(&self) -> bool {
        self.format.contains(FormatFlags::INSTRUMENTS)
    }

    /// Check if Amiga period limits apply
    pub fn uses_amiga_limits(&self) -> bool {
        self.format.contains(FormatFlags::AMIGA_LIMITS)
    }
}

/// Container format a module was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// FastTracker 2 Extended Module
    Xm,
    /// ProTracker-family MOD
    Mod,
}

impl SourceFormat {
    /// Short type name (file extension)
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Xm => "xm",
            Self::Mod => "mod",
        }
    }

    /// Descriptive type name
    pub fn long_name(self) -> &'static str {
        match self {
            Self::Xm => "FastTracker II",
            Self::Mod => "ProTracker",
        }
    }
}

/// One entry of the order list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEntry {
    /// Play this pattern
    Pattern(u16),
    /// Marker entry that playback steps over
    Skip,
    /// Marker entry that ends the song
    End,
}

impl OrderEntry {
    /// Raw value used by the classic order-list encoding
    pub const SKIP_MARKER: u8 = 254;
    pub const END_MARKER: u8 = 255;

    /// Resolve a raw order byte against the number of stored patterns
    ///
    /// Entries pointing past the pattern list become [`OrderEntry::Skip`].
    pub fn from_raw(raw: u8, num_patterns: usize) -> Self {
        match raw {
            Self::SKIP_MARKER => Self::Skip,
            Self::END_MARKER => Self::End,
            p if (p as usize) < num_patterns => Self::Pattern(p as u16),
            _ => Self::Skip,
        }
    }

    /// Pattern index, or the skip/end marker value
    pub fn to_index(self) -> i32 {
        match self {
            Self::Pattern(p) => p as i32,
            Self::Skip => Self::SKIP_MARKER as i32,
            Self::End => Self::END_MARKER as i32,
        }
    }
}

/// Convert a raw order table, recording a warning for every dangling entry
pub(crate) fn convert_orders(
    raw: &[u8],
    num_patterns: usize,
    warnings: &mut Vec<String>,
) -> Vec<OrderEntry> {
    raw.iter()
        .enumerate()
        .map(|(position, &value)| {
            let entry = OrderEntry::from_raw(value, num_patterns);
            if entry == OrderEntry::Skip && value != OrderEntry::SKIP_MARKER {
                tracing::warn!(position, pattern = value, "order entry references a missing pattern");
                warnings.push(format!(
                    "order {position} references missing pattern {value}; skipped"
                ));
            }
            entry
        })
        .collect()
}

/// Format-specific flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatFlags(u16);

impl FormatFlags {
    /// Use linear frequency slides (vs Amiga periods)
    pub const LINEAR_SLIDES: Self = Self(0x0001);
    /// Module has real instruments with envelopes (vs samples-only)
    pub const INSTRUMENTS: Self = Self(0x0002);
    /// Clamp periods to the Amiga range (ProTracker B-3..C-1 limits)
    pub const AMIGA_LIMITS: Self = Self(0x0004);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for FormatFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Join non-empty names into a message, dropping trailing blank lines
pub(crate) fn message_from_names<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    let lines: Vec<&str> = names.collect();
    let used = lines.iter().rposition(|l| !l.trim().is_empty())? + 1;
    Some(lines[..used].join("\n"))
}
