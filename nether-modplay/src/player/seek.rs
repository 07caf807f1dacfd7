//! Seeking and subsong selection
//!
//! Positions come from the subsong timelines built at load time, never
//! from rendering. With `seek.sync_samples` on, the rows before the target
//! are replayed through the engine (without mixing) so notes, effect
//! memory and sample positions match uninterrupted playback.

use nether_tracker::{SourceFormat, TrackerModule};

use super::{PlaybackStatus, Player};
use crate::error::{Error, Result};
use crate::sequencer::{RowAdvance, Sequencer, tick_seconds};
use crate::timeline::Subsong;

impl Player {
    /// Select a subsong and rewind to its start
    pub fn select_subsong(&mut self, index: i32) -> Result<()> {
        let count = self.module.subsongs().len();
        let index = usize::try_from(index)
            .ok()
            .filter(|&i| i < count)
            .ok_or_else(|| Error::invalid_index("subsong", index))?;
        self.subsong = index;
        self.restart_subsong();
        self.pending_start = self.status == PlaybackStatus::Stopped;
        Ok(())
    }

    /// Seek to a time in seconds of output, clamped to the subsong
    ///
    /// Playback resumes at the start of the row playing at that time.
    /// Returns the new position.
    pub fn set_position_seconds(&mut self, seconds: f64) -> f64 {
        let subsong = self.subsong_data();
        let song_seconds = if seconds.is_finite() {
            (seconds.max(0.0) * self.config.tempo_factor).min(subsong.duration_seconds)
        } else {
            0.0
        };
        if !subsong.is_empty() {
            let index = subsong.entry_at_seconds(song_seconds);
            self.go_to_entry(index);
        }
        self.position_seconds()
    }

    /// Seek to an order and row; returns the new position in seconds
    ///
    /// A row the selected subsong never plays is looked up in the other
    /// subsongs (selecting the one that plays it). A row no subsong plays
    /// is jumped to directly and reports position 0; the position then
    /// counts up from there as rows play.
    pub fn seek_order_row(&mut self, order: i32, row: i32) -> Result<f64> {
        let tracker = self.module.tracker();
        let order = u16::try_from(order)
            .ok()
            .filter(|&o| tracker.pattern_at_order(o).is_some_and(|p| p.num_rows > 0))
            .ok_or_else(|| Error::invalid_index("order", order))?;
        let num_rows = tracker.pattern_at_order(order).map_or(0, |p| p.num_rows);
        let row = u16::try_from(row)
            .ok()
            .filter(|&r| r < num_rows)
            .ok_or_else(|| Error::invalid_index("row", row))?;

        let found = self.subsong_data().entry_index(order, row).map(|e| (self.subsong, e)).or_else(|| {
            self.module
                .subsongs()
                .iter()
                .enumerate()
                .find_map(|(s, subsong)| subsong.entry_index(order, row).map(|e| (s, e)))
        });

        match found {
            Some((subsong, index)) => {
                self.subsong = subsong;
                self.go_to_entry(index);
            }
            None => self.go_to_unreached(order, row),
        }
        Ok(self.position_seconds())
    }

    /// Put the cursor on a timeline row, restoring timing and voices
    fn go_to_entry(&mut self, index: usize) {
        let previous = self.status;
        self.status = PlaybackStatus::Seeking;

        // A second handle lets the replay borrow the module while mutating self
        let module = self.module.clone();
        let tracker = module.tracker();
        let subsong = &module.subsongs()[self.subsong];

        if let Some(entry) = subsong.rows.get(index).copied() {
            self.engine.reset(tracker);
            if self.config.sync_samples {
                self.replay_to(tracker, subsong, index);
            } else {
                self.seq.set_position(
                    entry.order,
                    entry.row,
                    entry.speed,
                    entry.tempo,
                    entry.global_volume,
                );
                self.engine.set_global_volume(entry.global_volume);
            }
            self.reset_cursor(Some(index), entry.seconds);
        }

        self.end_seek(previous);
    }

    /// Jump to a row outside every timeline with the current timing
    ///
    /// Playback runs off the timeline from here, timing rows as it plays
    /// them, until it reaches a row the subsong's timeline contains.
    fn go_to_unreached(&mut self, order: u16, row: u16) {
        let previous = self.status;
        self.status = PlaybackStatus::Seeking;

        self.engine.reset(self.module.tracker());
        let (speed, tempo, global_volume) = (self.seq.speed, self.seq.tempo, self.seq.global_volume);
        self.seq.set_position(order, row, speed, tempo, global_volume);
        self.engine.set_global_volume(global_volume);
        self.reset_cursor(None, 0.0);
        self.detour.clear();

        self.end_seek(previous);
    }

    fn reset_cursor(&mut self, row_index: Option<usize>, song_seconds: f64) {
        self.row_index = row_index;
        self.row_active = false;
        self.tick = 0;
        self.row_ticks = 0;
        self.tick_frames_left = 0;
        self.frame_remainder = 0.0;
        self.song_seconds = song_seconds;
        self.row_start_seconds = song_seconds;
        self.finished = false;
    }

    fn end_seek(&mut self, previous: PlaybackStatus) {
        self.status = previous;
        if previous == PlaybackStatus::Stopped {
            self.pending_start = true;
        }
    }

    /// Run rows `0..index` of a subsong through the engine without mixing
    fn replay_to(&mut self, tracker: &TrackerModule, subsong: &Subsong, index: usize) {
        let effect_memory = tracker.source == SourceFormat::Xm;
        let pitch_factor = self.config.pitch_factor;
        let tempo_factor = self.config.tempo_factor;

        let mut seq = Sequencer::new(tracker, subsong.start_order);
        if let Some(first) = subsong.rows.first() {
            seq.set_position(
                first.order,
                first.row,
                first.speed,
                first.tempo,
                first.global_volume,
            );
        }

        for _ in 0..index {
            let Some(pattern) = tracker.pattern_at_order(seq.order) else {
                break;
            };
            seq.begin_row(pattern, effect_memory);
            let tick_time = tick_seconds(seq.tempo) / tempo_factor;

            self.engine.process_row(tracker, pattern, seq.row);
            self.engine.fast_forward(tracker, tick_time, pitch_factor);
            for tick in 1..seq.row_ticks() {
                self.engine.process_tick(tracker, tick, seq.speed);
                self.engine.fast_forward(tracker, tick_time, pitch_factor);
            }

            if seq.advance(tracker) == RowAdvance::End {
                break;
            }
        }
        self.seq = seq;
    }
}
