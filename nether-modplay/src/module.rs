//! Loaded module handle and the read-only pattern/order model

use std::fmt::Write as _;
use std::sync::Arc;

use nether_tracker::{OrderEntry, TrackerModule, TrackerNote, TrackerPattern};
use serde::Serialize;
use tracing::info;

use crate::MAX_CHANNELS;
use crate::config::RenderConfig;
use crate::controls::Controls;
use crate::error::{Error, Result};
use crate::loader::{LoadOptions, load_tracker_module};
use crate::metadata::Metadata;
use crate::timeline::{Subsong, build_subsongs};

/// Rows per beat reported for every pattern (XM/MOD store no highlights)
pub const DEFAULT_ROWS_PER_BEAT: i32 = 4;
/// Rows per measure reported for every pattern
pub const DEFAULT_ROWS_PER_MEASURE: i32 = 16;

/// Immutable data shared by every clone of a [`Module`]
#[derive(Debug)]
pub(crate) struct ModuleData {
    pub(crate) tracker: TrackerModule,
    pub(crate) subsongs: Vec<Subsong>,
    pub(crate) metadata: Metadata,
    pub(crate) load_options: LoadOptions,
    /// Render controls given at load time
    pub(crate) default_config: RenderConfig,
}

/// A loaded module
///
/// Cloning is cheap: clones share the same immutable data, so one module
/// can feed players on several threads.
#[derive(Debug, Clone)]
pub struct Module {
    pub(crate) inner: Arc<ModuleData>,
}

/// The five columns of a pattern cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// 0 = none, 1-96 = C-0..B-7, 254 = cut, 255 = off
    pub note: u8,
    pub instrument: u8,
    /// Raw volume column byte
    pub volume: u8,
    pub effect: u8,
    pub param: u8,
}

impl From<&TrackerNote> for Cell {
    fn from(note: &TrackerNote) -> Self {
        Self {
            note: note.note,
            instrument: note.instrument,
            volume: note.volume,
            effect: note.effect_cmd,
            param: note.effect_param,
        }
    }
}

impl Module {
    /// Load XM or MOD data with default controls
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_controls(data, &Controls::new())
    }

    /// Load with load-time controls; render controls become the player defaults
    pub fn from_bytes_with_controls(data: &[u8], controls: &Controls) -> Result<Self> {
        controls.validate()?;
        let load_options = controls.load_options();
        let mut default_config = RenderConfig::default();
        controls.apply_to(&mut default_config)?;

        let tracker = load_tracker_module(data, &load_options)?;
        Ok(Self::build(tracker, load_options, default_config))
    }

    /// Wrap an already converted module
    pub fn from_tracker_module(tracker: TrackerModule) -> Result<Self> {
        if tracker.num_channels == 0 || tracker.num_channels as usize > MAX_CHANNELS {
            return Err(Error::CorruptData(format!(
                "channel count {} outside 1..={MAX_CHANNELS}",
                tracker.num_channels
            )));
        }
        Ok(Self::build(tracker, LoadOptions::default(), RenderConfig::default()))
    }

    fn build(tracker: TrackerModule, load_options: LoadOptions, default_config: RenderConfig) -> Self {
        let subsongs = build_subsongs(&tracker);
        let metadata = Metadata::from_module(&tracker);
        info!(
            format = tracker.source.short_name(),
            title = %tracker.name.trim_end(),
            channels = tracker.num_channels,
            orders = tracker.orders.len(),
            subsongs = subsongs.len(),
            duration = subsongs.first().map_or(0.0, |s| s.duration_seconds),
            "module loaded"
        );
        Self {
            inner: Arc::new(ModuleData {
                tracker,
                subsongs,
                metadata,
                load_options,
                default_config,
            }),
        }
    }

    /// The unified module model (read-only)
    pub fn tracker(&self) -> &TrackerModule {
        &self.inner.tracker
    }

    pub fn subsongs(&self) -> &[Subsong] {
        &self.inner.subsongs
    }

    pub fn num_subsongs(&self) -> i32 {
        self.inner.subsongs.len() as i32
    }

    /// Duration of the first subsong
    pub fn duration_seconds(&self) -> f64 {
        self.inner.subsongs.first().map_or(0.0, |s| s.duration_seconds)
    }

    pub fn load_options(&self) -> LoadOptions {
        self.inner.load_options
    }

    /// Render settings a new player starts with
    pub fn default_config(&self) -> &RenderConfig {
        &self.inner.default_config
    }

    // =========================================================================
    // Counts
    // =========================================================================

    pub fn num_patterns(&self) -> i32 {
        self.tracker().patterns.len() as i32
    }

    pub fn num_orders(&self) -> i32 {
        self.tracker().orders.len() as i32
    }

    pub fn num_channels(&self) -> i32 {
        self.tracker().num_channels as i32
    }

    /// Instruments as the format defines them (0 for sample-only MOD files)
    pub fn num_instruments(&self) -> i32 {
        let tracker = self.tracker();
        if tracker.uses_instruments() {
            tracker.instruments.len() as i32
        } else {
            0
        }
    }

    pub fn num_samples(&self) -> i32 {
        self.tracker().samples.len() as i32
    }

    // =========================================================================
    // Patterns and orders
    // =========================================================================

    pub(crate) fn pattern(&self, pattern: i32) -> Option<&TrackerPattern> {
        self.tracker().patterns.get(usize::try_from(pattern).ok()?)
    }

    /// Cell at a coordinate, checking every index
    pub(crate) fn note_at(&self, pattern: i32, row: i32, channel: i32) -> Option<&TrackerNote> {
        if channel < 0 || channel >= self.num_channels() {
            return None;
        }
        let pattern = self.pattern(pattern)?;
        pattern.get_note(u16::try_from(row).ok()?, channel as u8)
    }

    /// Rows in a pattern, 0 for an invalid index
    pub fn pattern_num_rows(&self, pattern: i32) -> i32 {
        self.pattern(pattern).map_or(0, |p| p.num_rows as i32)
    }

    pub fn pattern_rows_per_beat(&self, pattern: i32) -> i32 {
        if self.pattern(pattern).is_some() {
            DEFAULT_ROWS_PER_BEAT
        } else {
            0
        }
    }

    pub fn pattern_rows_per_measure(&self, pattern: i32) -> i32 {
        if self.pattern(pattern).is_some() {
            DEFAULT_ROWS_PER_MEASURE
        } else {
            0
        }
    }

    /// Pattern name; XM and MOD patterns are unnamed, so always ""
    pub fn pattern_name(&self, _pattern: i32) -> String {
        String::new()
    }

    pub fn pattern_names(&self) -> Vec<String> {
        (0..self.num_patterns()).map(|p| self.pattern_name(p)).collect()
    }

    /// Index of the first pattern with this name
    pub fn find_pattern(&self, name: &str) -> Option<i32> {
        if name.is_empty() {
            return None;
        }
        (0..self.num_patterns()).find(|&p| self.pattern_name(p) == name)
    }

    /// Pattern index at an order position: 254 skip, 255 end, -1 invalid
    pub fn order_pattern(&self, order: i32) -> i32 {
        u16::try_from(order)
            .ok()
            .and_then(|o| self.tracker().order(o))
            .map_or(-1, OrderEntry::to_index)
    }

    pub fn order_sequence(&self) -> Vec<i32> {
        self.tracker().orders.iter().map(|o| o.to_index()).collect()
    }

    pub fn pattern_cell(&self, pattern: i32, row: i32, channel: i32) -> Option<Cell> {
        self.note_at(pattern, row, channel).map(Cell::from)
    }

    /// Display string for a cell, such as `C-4 01 v64 F06`; "" when invalid
    pub fn format_cell(&self, pattern: i32, row: i32, channel: i32) -> String {
        self.note_at(pattern, row, channel)
            .map(format_note)
            .unwrap_or_default()
    }
}

/// Volume column letter and value for a raw XM volume byte
fn volume_column(volume: u8) -> Option<(char, u8)> {
    match volume {
        0x10..=0x50 => Some(('v', volume - 0x10)),
        0x60..=0xFF => {
            let letter = match volume >> 4 {
                0x6 => 'd',
                0x7 => 'c',
                0x8 => 'b',
                0x9 => 'a',
                0xA => 'u',
                0xB => 'h',
                0xC => 'p',
                0xD => 'l',
                0xE => 'r',
                _ => 'g',
            };
            Some((letter, volume & 0x0F))
        }
        _ => None,
    }
}

/// Effect letter: 0-9 then A-Z, as trackers number commands
fn effect_letter(effect: u8) -> char {
    char::from_digit(effect as u32, 36).map_or('?', |c| c.to_ascii_uppercase())
}

fn format_note(note: &TrackerNote) -> String {
    let mut text = note.note_name();
    text.push(' ');
    if note.instrument > 0 {
        let _ = write!(text, "{:02}", note.instrument);
    } else {
        text.push_str("..");
    }
    text.push(' ');
    match volume_column(note.volume) {
        Some((letter, value)) => {
            let _ = write!(text, "{letter}{value:02}");
        }
        None => text.push_str("..."),
    }
    text.push(' ');
    if note.effect_cmd == 0 && note.effect_param == 0 {
        text.push_str("...");
    } else {
        let _ = write!(text, "{}{:02X}", effect_letter(note.effect_cmd), note.effect_param);
    }
    text
}
