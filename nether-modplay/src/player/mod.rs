//! Playback: one cursor through a shared [`Module`]
//!
//! A [`Player`] owns the sequencer, channel voices and render settings.
//! Several players may share one module across threads; each player is
//! used from one thread at a time.
//!
//! - `render.rs`: tick scheduling and the sample output calls
//! - `seek.rs`: seeking by time or order/row, subsong selection

mod render;
mod seek;


use nether_tracker::OrderEntry;
use serde::Serialize;

use crate::config::{RenderConfig, RenderParam};
use crate::controls::{self, is_load_key};
use crate::engine::{Engine, MixSettings};
use crate::error::{Error, Result};
use crate::module::Module;
use crate::sequencer::{Sequencer, VisitedRows};
use crate::timeline::Subsong;

/// Output rate used for settings until the first render call names one
const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Where the player is in its state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    /// Only observable while a seek call is running
    Seeking,
}

/// Snapshot of a player's cursor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub subsong: usize,
    pub order: i32,
    /// Pattern at the current order, -1 when there is none
    pub pattern: i32,
    pub row: i32,
    pub speed: i32,
    pub tempo: i32,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub repeat_count: i32,
}

/// A playback cursor with its own channel state
pub struct Player {
    module: Module,
    engine: Engine,
    seq: Sequencer,
    config: RenderConfig,
    settings: MixSettings,
    status: PlaybackStatus,

    subsong: usize,
    /// Index into the subsong's row timeline of the current row; `None`
    /// after a seek to a row no timeline reaches, until playback rejoins one
    row_index: Option<usize>,
    /// Rows played since leaving the timeline
    detour: VisitedRows,
    /// Tick 0 of the current row has been processed
    row_active: bool,
    tick: u32,
    row_ticks: u32,
    tick_frames_left: u32,
    /// Fractional frames carried between ticks
    frame_remainder: f64,
    /// Song time (tempo factor 1.0) of the current tick
    song_seconds: f64,
    /// Song time at tick 0 of the current row
    row_start_seconds: f64,

    /// A seek while stopped chose where `play` starts
    pending_start: bool,
    /// The song ended and no repeats were left
    finished: bool,
    repeats_left: i32,
}

impl Player {
    /// Player with the module's default config (load-time controls applied)
    pub fn new(module: Module) -> Self {
        let config = module.default_config().clone();
        Self::with_config(module, config)
    }

    pub fn with_config(module: Module, config: RenderConfig) -> Self {
        let engine = Engine::new(module.tracker());
        let seq = Sequencer::new(module.tracker(), 0);
        let detour = VisitedRows::new(module.tracker());
        let settings = MixSettings::new(&config, DEFAULT_SAMPLE_RATE);
        let repeats_left = config.repeat_count;
        let mut player = Self {
            module,
            engine,
            seq,
            config,
            settings,
            status: PlaybackStatus::Stopped,
            subsong: 0,
            row_index: Some(0),
            detour,
            row_active: false,
            tick: 0,
            row_ticks: 0,
            tick_frames_left: 0,
            frame_remainder: 0.0,
            song_seconds: 0.0,
            row_start_seconds: 0.0,
            pending_start: false,
            finished: false,
            repeats_left,
        };
        player.restart_subsong();
        player
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replace the whole render config
    pub fn set_config(&mut self, config: RenderConfig) -> Result<()> {
        config.validate()?;
        self.repeats_left = config.repeat_count;
        self.config = config;
        self.refresh_settings();
        Ok(())
    }

    fn refresh_settings(&mut self) {
        self.settings = MixSettings::new(&self.config, self.settings.sample_rate);
    }

    pub(crate) fn subsong_data(&self) -> &Subsong {
        &self.module.subsongs()[self.subsong]
    }

    // =========================================================================
    // State machine
    // =========================================================================

    /// Start playing; from Stopped this restarts the subsong unless a seek
    /// chose a position
    pub fn play(&mut self) {
        if self.status == PlaybackStatus::Stopped {
            if !self.pending_start {
                self.restart_subsong();
            }
            self.pending_start = false;
            self.status = PlaybackStatus::Playing;
        }
    }

    pub fn stop(&mut self) {
        self.status = PlaybackStatus::Stopped;
        self.pending_start = false;
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Rewind to the start of the selected subsong with fresh channel state
    pub(crate) fn restart_subsong(&mut self) {
        let tracker = self.module.tracker();
        let subsong = &self.module.subsongs()[self.subsong];

        self.engine.reset(tracker);
        self.seq = Sequencer::new(tracker, subsong.start_order);
        if let Some(first) = subsong.rows.first() {
            self.seq.set_position(
                first.order,
                first.row,
                first.speed,
                first.tempo,
                first.global_volume,
            );
        }

        self.row_index = Some(0);
        self.row_active = false;
        self.tick = 0;
        self.row_ticks = 0;
        self.tick_frames_left = 0;
        self.frame_remainder = 0.0;
        self.song_seconds = 0.0;
        self.row_start_seconds = 0.0;
        self.finished = false;
        self.repeats_left = self.config.repeat_count;
    }

    // =========================================================================
    // Repeat
    // =========================================================================

    /// -1 repeats forever, 0 plays once, n > 0 plays n extra times
    pub fn set_repeat_count(&mut self, count: i32) -> Result<()> {
        if count < -1 {
            return Err(Error::invalid_control("repeat_count", &count.to_string()));
        }
        self.config.repeat_count = count;
        self.repeats_left = count;
        Ok(())
    }

    pub fn repeat_count(&self) -> i32 {
        self.config.repeat_count
    }

    // =========================================================================
    // Position queries
    // =========================================================================

    pub fn current_order(&self) -> i32 {
        self.seq.order as i32
    }

    /// Pattern at the current order, -1 on a marker
    pub fn current_pattern(&self) -> i32 {
        match self.module.tracker().order(self.seq.order) {
            Some(OrderEntry::Pattern(p)) => p as i32,
            _ => -1,
        }
    }

    pub fn current_row(&self) -> i32 {
        self.seq.row as i32
    }

    pub fn current_speed(&self) -> i32 {
        self.seq.speed as i32
    }

    pub fn current_tempo(&self) -> i32 {
        self.seq.tempo as i32
    }

    /// Playback position in seconds of output, tempo factor included
    pub fn position_seconds(&self) -> f64 {
        self.song_seconds / self.config.tempo_factor
    }

    /// Length of the selected subsong in seconds of output
    pub fn duration_seconds(&self) -> f64 {
        self.subsong_data().duration_seconds / self.config.tempo_factor
    }

    pub fn num_subsongs(&self) -> i32 {
        self.module.num_subsongs()
    }

    pub fn selected_subsong(&self) -> i32 {
        self.subsong as i32
    }

    /// Channels currently producing sound
    pub fn active_channels(&self) -> i32 {
        self.engine.active_voices() as i32
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            status: self.status,
            subsong: self.subsong,
            order: self.current_order(),
            pattern: self.current_pattern(),
            row: self.current_row(),
            speed: self.current_speed(),
            tempo: self.current_tempo(),
            position_seconds: self.position_seconds(),
            duration_seconds: self.duration_seconds(),
            repeat_count: self.repeat_count(),
        }
    }

    // =========================================================================
    // Controls
    // =========================================================================

    /// Value of a control; "" for unknown keys
    pub fn ctl_get(&self, key: &str) -> String {
        let options = self.module.load_options();
        match key {
            controls::LOAD_SKIP_SAMPLES => controls::format_bool(options.skip_samples).to_string(),
            controls::LOAD_SKIP_PATTERNS => {
                controls::format_bool(options.skip_patterns).to_string()
            }
            _ => self.config.get(key).unwrap_or_default(),
        }
    }

    /// Change a play/render/seek control
    ///
    /// Load controls only apply while loading and are refused here.
    pub fn ctl_set(&mut self, key: &str, value: &str) -> Result<()> {
        if is_load_key(key) {
            if controls::KNOWN_KEYS.contains(&key) {
                return Err(Error::UnsupportedOperation(
                    "load controls can only be given when loading",
                ));
            }
            return Err(Error::invalid_control(key, value));
        }
        self.config.set(key, value)?;
        self.refresh_settings();
        Ok(())
    }

    pub fn render_param(&self, param: RenderParam) -> i32 {
        self.config.render_param(param)
    }

    pub fn set_render_param(&mut self, param: RenderParam, value: i32) -> Result<()> {
        self.config.set_render_param(param, value)?;
        self.refresh_settings();
        Ok(())
    }
}
