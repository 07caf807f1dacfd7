//! Tracker engine
//!
//! Channel state machine driven by the player one tick at a time:
//! - Row processing (notes, instruments, tick-0 effects)
//! - Per-tick effects, envelopes and fadeout
//! - Mixing voices into interleaved stereo

mod effects;
mod mixing;
mod row_processing;
mod tick;


pub(crate) use mixing::MixSettings;

use nether_tracker::{SourceFormat, TrackerModule};

use crate::MAX_CHANNELS;
use crate::channels::Voice;
use crate::utils::{
    AMIGA_MAX_PERIOD, AMIGA_MIN_PERIOD, MAX_PERIOD, amiga_note_period, amiga_period_to_frequency,
    linear_note_period, linear_period_to_frequency,
};

/// Maximum volume level for volume envelopes
pub(crate) const VOLUME_ENVELOPE_MAX: f32 = 64.0;

/// Maximum volume fadeout value (16-bit)
pub(crate) const VOLUME_FADEOUT_MAX: f32 = 65535.0;

/// Maximum channel and global volume (0-64)
pub(crate) const CHANNEL_VOLUME_MAX: f32 = 64.0;

/// Panning envelope center value
pub(crate) const PAN_ENVELOPE_CENTER: f32 = 32.0;

/// Highest note reachable after applying a sample's relative note
const MAX_REAL_NOTE: i16 = 119;

/// Map 0-255 panning (128 = center) to -1.0..=1.0
pub(crate) fn pan_from_u8(pan: u8) -> f32 {
    ((pan as f32 - 128.0) / 127.0).clamp(-1.0, 1.0)
}

/// Channel voices plus song-wide state the mixer needs
pub(crate) struct Engine {
    pub(crate) voices: Box<[Voice; MAX_CHANNELS]>,
    pub(crate) num_channels: usize,
    /// Global volume (0.0-1.0)
    pub(crate) global_volume: f32,
    last_global_vol_slide: u8,
    global_slide_active: bool,
    /// Periods are linear (XM) rather than Amiga
    linear: bool,
    /// Clamp Amiga slides to the ProTracker range
    amiga_limits: bool,
    /// A zero parameter reuses the last one for slides (XM)
    effect_memory: bool,
}

impl Engine {
    pub(crate) fn new(module: &TrackerModule) -> Self {
        let mut engine = Self {
            voices: Box::new(std::array::from_fn(|_| Voice::default())),
            num_channels: 0,
            global_volume: 1.0,
            last_global_vol_slide: 0,
            global_slide_active: false,
            linear: false,
            amiga_limits: false,
            effect_memory: false,
        };
        engine.reset(module);
        engine
    }

    /// Silence every voice and restore the module's initial channel state
    pub(crate) fn reset(&mut self, module: &TrackerModule) {
        self.num_channels = (module.num_channels as usize).min(MAX_CHANNELS);
        self.linear = module.uses_linear_slides();
        self.amiga_limits = module.uses_amiga_limits();
        self.effect_memory = module.source == SourceFormat::Xm;
        self.global_volume = module.global_volume.min(64) as f32 / CHANNEL_VOLUME_MAX;
        self.last_global_vol_slide = 0;
        self.global_slide_active = false;

        for (index, voice) in self.voices.iter_mut().enumerate() {
            voice.reset();
            voice.panning = module
                .channel_panning
                .get(index)
                .copied()
                .map(pan_from_u8)
                .unwrap_or(0.0);
        }
    }

    /// Set global volume from a 0-64 value
    pub(crate) fn set_global_volume(&mut self, volume: u8) {
        self.global_volume = volume.min(64) as f32 / CHANNEL_VOLUME_MAX;
    }

    /// Number of voices currently producing sound
    pub(crate) fn active_voices(&self) -> usize {
        self.voices[..self.num_channels]
            .iter()
            .filter(|v| v.active)
            .count()
    }

    /// Period of a note (after relative note) with finetune
    pub(crate) fn note_period(&self, note: u8, finetune: i8) -> f32 {
        if self.linear {
            linear_note_period(note, finetune)
        } else {
            amiga_note_period(note, finetune)
        }
    }

    /// Apply a sample's relative note to a pattern note
    pub(crate) fn real_note(note: u8, relative_note: i8) -> u8 {
        (note as i16 + relative_note as i16).clamp(1, MAX_REAL_NOTE) as u8
    }

    /// Frequency of a period, raised by `semitones` (arpeggio)
    pub(crate) fn period_frequency(&self, period: f32, semitones: u8) -> f32 {
        if self.linear {
            linear_period_to_frequency(period - semitones as f32 * 64.0)
        } else if semitones > 0 {
            amiga_period_to_frequency(period) * 2f32.powf(semitones as f32 / 12.0)
        } else {
            amiga_period_to_frequency(period)
        }
    }

    /// Period units per slide step for 1xx/2xx/3xx/E1x/E2x
    pub(crate) fn slide_unit(&self) -> f32 {
        if self.linear { 4.0 } else { 1.0 }
    }

    /// Period units per extra-fine slide step
    pub(crate) fn extra_fine_unit(&self) -> f32 {
        if self.linear { 1.0 } else { 0.25 }
    }

    /// Slide a period by `delta` (negative raises pitch)
    ///
    /// With Amiga limits the period stays inside 113..=856, but a period
    /// that is already outside is never pushed further out.
    pub(crate) fn slide_period(&self, period: f32, delta: f32) -> f32 {
        let next = period + delta;
        if self.amiga_limits {
            if delta < 0.0 {
                next.max(AMIGA_MIN_PERIOD.min(period))
            } else {
                next.min(AMIGA_MAX_PERIOD.max(period))
            }
        } else {
            next.clamp(1.0, MAX_PERIOD)
        }
    }

    /// Snap a period to the nearest semitone (glissando)
    pub(crate) fn round_to_semitone(&self, period: f32, finetune: i8) -> f32 {
        if self.linear {
            let offset = finetune as f32 / 2.0;
            ((period + offset) / 64.0).round() * 64.0 - offset
        } else if period > 0.0 {
            let semitones = (12.0 * (crate::utils::C4_AMIGA_PERIOD / period).log2()).round();
            crate::utils::C4_AMIGA_PERIOD * 2f32.powf(-semitones / 12.0)
        } else {
            period
        }
    }
}
