//! Tick scheduling and sample output
//!
//! Nothing here allocates except [`Player::render`], which is the
//! convenience wrapper around [`Player::read_interleaved_stereo`].

use nether_tracker::SourceFormat;

use super::{PlaybackStatus, Player};
use crate::config::EndBehaviour;
use crate::engine::MixSettings;
use crate::sequencer::{RowAdvance, tick_seconds};
use crate::utils::frames_per_tick;
use crate::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};

/// Frames mixed per pass by the planar output call
const PLANAR_CHUNK_FRAMES: usize = 512;

impl Player {
    /// Render interleaved stereo frames into `out`
    ///
    /// Returns the number of frames written. A count below `out.len() / 2`
    /// means the song ended inside this call; 0 means there is nothing left
    /// to play (or the player is stopped, or the rate is unsupported).
    pub fn read_interleaved_stereo(&mut self, sample_rate: u32, out: &mut [f32]) -> usize {
        let frames = out.len() / 2;
        if frames == 0 || !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return 0;
        }
        if self.status != PlaybackStatus::Playing {
            return 0;
        }
        if self.finished {
            // Only reachable with EndBehaviour::Continue
            self.restart_subsong();
        }
        if self.settings.sample_rate != sample_rate {
            self.settings = MixSettings::new(&self.config, sample_rate);
        }

        let mut done = 0;
        while done < frames {
            if self.tick_frames_left == 0 {
                if !self.next_tick() {
                    break;
                }
                continue;
            }
            let count = (frames - done).min(self.tick_frames_left as usize);
            self.engine.mix(
                self.module.tracker(),
                &mut out[done * 2..(done + count) * 2],
                &self.settings,
            );
            done += count;
            self.tick_frames_left -= count as u32;
        }
        done
    }

    /// Render into separate left and right buffers
    pub fn read_stereo(&mut self, sample_rate: u32, left: &mut [f32], right: &mut [f32]) -> usize {
        let frames = left.len().min(right.len());
        let mut buffer = [0.0f32; PLANAR_CHUNK_FRAMES * 2];
        let mut done = 0;

        while done < frames {
            let want = (frames - done).min(PLANAR_CHUNK_FRAMES);
            let got = self.read_interleaved_stereo(sample_rate, &mut buffer[..want * 2]);
            for (i, frame) in buffer[..got * 2].chunks_exact(2).enumerate() {
                left[done + i] = frame[0];
                right[done + i] = frame[1];
            }
            done += got;
            if got < want {
                break;
            }
        }
        done
    }

    /// Render up to `frames` frames into a new buffer, shortened at song end
    pub fn render(&mut self, sample_rate: u32, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * 2];
        let written = self.read_interleaved_stereo(sample_rate, &mut out);
        out.truncate(written * 2);
        out
    }

    /// Process the next tick and schedule its frames; false once the song is over
    fn next_tick(&mut self) -> bool {
        if self.row_active {
            self.tick += 1;
            if self.tick < self.row_ticks {
                self.song_seconds += tick_seconds(self.seq.tempo);
                self.engine
                    .process_tick(self.module.tracker(), self.tick, self.seq.speed);
                self.schedule_tick();
                return true;
            }
            self.row_active = false;
            if !self.advance_row() {
                return false;
            }
        }
        self.start_row()
    }

    /// Tick 0 of the row under the cursor
    fn start_row(&mut self) -> bool {
        let tracker = self.module.tracker();
        let in_range = self
            .row_index
            .is_none_or(|index| index < self.module.subsongs()[self.subsong].rows.len());
        let Some(pattern) = tracker
            .pattern_at_order(self.seq.order)
            .filter(|_| in_range)
        else {
            self.finish();
            return false;
        };

        if self.row_index.is_none() {
            self.detour.mark(self.seq.order, self.seq.row);
        }
        self.row_start_seconds = self.song_seconds;
        self.seq.begin_row(pattern, tracker.source == SourceFormat::Xm);
        self.engine.process_row(tracker, pattern, self.seq.row);
        self.row_ticks = self.seq.row_ticks();
        self.tick = 0;
        self.row_active = true;
        self.schedule_tick();
        true
    }

    fn advance_row(&mut self) -> bool {
        // Rows are timed the same way the timeline walk times them
        self.song_seconds = self.row_start_seconds + self.seq.row_seconds();

        let advance = self.seq.advance(self.module.tracker());
        let target = (self.seq.order, self.seq.row);
        match (advance, self.row_index) {
            (RowAdvance::End, _) => self.loop_or_end(None),
            (RowAdvance::Next { .. }, Some(index)) => {
                if index + 1 < self.subsong_data().rows.len() {
                    self.row_index = Some(index + 1);
                    true
                } else {
                    // The walk stopped here because this row was already played
                    self.loop_or_end(Some(target))
                }
            }
            (RowAdvance::Next { looped }, None) => {
                if let Some(index) = self.subsong_data().entry_index(target.0, target.1) {
                    self.row_index = Some(index);
                    true
                } else if !looped && self.detour.is_visited(target.0, target.1) {
                    self.loop_or_end(Some(target))
                } else {
                    true
                }
            }
        }
    }

    /// Song end reached: loop if repeats are left, otherwise finish
    ///
    /// `target` is where a backward jump wanted to go; `None` is a natural
    /// end, which loops to the module's restart position.
    fn loop_or_end(&mut self, target: Option<(u16, u16)>) -> bool {
        if self.repeats_left == 0 {
            self.finish();
            return false;
        }
        if self.repeats_left > 0 {
            self.repeats_left -= 1;
        }

        let subsong = &self.module.subsongs()[self.subsong];
        if let Some(index) = target.and_then(|(order, row)| subsong.entry_index(order, row)) {
            self.row_index = Some(index);
            self.song_seconds = subsong.rows[index].seconds;
            return true;
        }

        let restart = self.module.tracker().restart_position;
        let index = subsong.entry_index(restart, 0).unwrap_or(0);
        let Some(entry) = subsong.rows.get(index).copied() else {
            self.finish();
            return false;
        };
        self.seq.set_position(
            entry.order,
            entry.row,
            entry.speed,
            entry.tempo,
            entry.global_volume,
        );
        self.engine.set_global_volume(entry.global_volume);
        self.row_index = Some(index);
        self.song_seconds = entry.seconds;
        true
    }

    fn finish(&mut self) {
        if self.row_index.is_some() {
            self.song_seconds = self.song_seconds.max(self.subsong_data().duration_seconds);
        }
        self.finished = true;
        self.row_active = false;
        self.tick_frames_left = 0;
        if self.config.end_behaviour == EndBehaviour::Stop {
            self.status = PlaybackStatus::Stopped;
            self.pending_start = false;
        }
    }

    /// Arm the mixer for the tick just processed and size it in frames
    fn schedule_tick(&mut self) {
        self.engine.prepare_mix(&self.settings);
        let frames = frames_per_tick(
            self.settings.sample_rate,
            self.seq.tempo,
            self.config.tempo_factor,
        ) + self.frame_remainder;
        let whole = frames.floor();
        self.frame_remainder = frames - whole;
        self.tick_frames_left = whole as u32;
    }
}
