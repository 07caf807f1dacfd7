//! Channel mixing: voices into interleaved stereo

use nether_tracker::TrackerModule;

use super::Engine;
use crate::config::{Interpolation, RenderConfig};
use crate::utils::{advance_position, fast_pan_gains, sample_voice};

/// Default ramping when the strength control is -1, in milliseconds
const DEFAULT_RAMP_MS: f32 = 2.0;
/// Tail faded out when a one-shot sample ends, relative to the ramp length
const FADE_OUT_RATIO: f32 = 1.5;

/// Mixer parameters derived from a [`RenderConfig`] and an output rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MixSettings {
    pub sample_rate: u32,
    pub interpolation: Interpolation,
    pub master_gain: f32,
    /// Pan multiplier: 0.0 mono, 1.0 as authored, 2.0 widened
    pub separation: f32,
    pub pitch_factor: f64,
    /// Frames over which gain changes are spread
    pub gain_ramp_frames: u32,
    /// Crossfade length when a note starts
    pub fade_in_frames: u32,
    /// Tail length when a sample ends
    pub fade_out_frames: u32,
}

impl MixSettings {
    pub(crate) fn new(config: &RenderConfig, sample_rate: u32) -> Self {
        let frames = |millis: f32| (sample_rate as f32 * millis / 1000.0) as u32;
        let ramp_ms = match config.volume_ramping_strength {
            -1 => DEFAULT_RAMP_MS,
            n => n.max(0) as f32,
        };
        Self {
            sample_rate,
            interpolation: config.interpolation,
            master_gain: config.master_gain(),
            separation: config.stereo_separation_percent as f32 / 100.0,
            pitch_factor: config.pitch_factor,
            gain_ramp_frames: frames(ramp_ms),
            fade_in_frames: frames(ramp_ms),
            fade_out_frames: frames(ramp_ms * FADE_OUT_RATIO),
        }
    }
}

impl Engine {
    /// Turn the per-tick outputs into gain targets and arm pending fades
    ///
    /// Called once per tick, before the tick's frames are mixed.
    pub(crate) fn prepare_mix(&mut self, settings: &MixSettings) {
        for voice in self.voices[..self.num_channels].iter_mut() {
            if voice.fade_in_pending {
                voice.fade_in_pending = false;
                voice.fade_in_remaining = settings.fade_in_frames;
                voice.fade_in_length = settings.fade_in_frames;
            }

            let (pan_left, pan_right) = fast_pan_gains(voice.pan * settings.separation);
            let gain = if voice.active { voice.gain * settings.master_gain } else { 0.0 };
            voice.target_left = gain * pan_left;
            voice.target_right = gain * pan_right;

            if voice.snap_gain || settings.gain_ramp_frames == 0 {
                voice.snap_gain = false;
                voice.gain_left = voice.target_left;
                voice.gain_right = voice.target_right;
                voice.ramp_remaining = 0;
            } else {
                let frames = settings.gain_ramp_frames as f32;
                voice.ramp_step_left = (voice.target_left - voice.gain_left) / frames;
                voice.ramp_step_right = (voice.target_right - voice.gain_right) / frames;
                voice.ramp_remaining = settings.gain_ramp_frames;
            }
        }
    }

    /// Mix every active voice into `out` (interleaved stereo, overwritten)
    pub(crate) fn mix(&mut self, module: &TrackerModule, out: &mut [f32], settings: &MixSettings) {
        out.fill(0.0);

        for voice in self.voices[..self.num_channels].iter_mut() {
            if !voice.active {
                continue;
            }
            let Some(sample) = voice.sample.and_then(|i| module.samples.get(i as usize)) else {
                voice.silence();
                continue;
            };
            let increment =
                voice.frequency as f64 * settings.pitch_factor / settings.sample_rate.max(1) as f64;

            for frame in out.chunks_exact_mut(2) {
                let value = sample_voice(
                    voice,
                    sample,
                    increment,
                    settings.interpolation,
                    settings.fade_out_frames,
                );

                if voice.ramp_remaining > 0 {
                    voice.ramp_remaining -= 1;
                    if voice.ramp_remaining == 0 {
                        voice.gain_left = voice.target_left;
                        voice.gain_right = voice.target_right;
                    } else {
                        voice.gain_left += voice.ramp_step_left;
                        voice.gain_right += voice.ramp_step_right;
                    }
                }

                frame[0] += value * voice.gain_left;
                frame[1] += value * voice.gain_right;

                if !voice.active {
                    break;
                }
            }
        }
    }

    /// Move sample positions forward by `seconds` without producing output
    pub(crate) fn fast_forward(&mut self, module: &TrackerModule, seconds: f64, pitch_factor: f64) {
        for voice in self.voices[..self.num_channels].iter_mut() {
            if !voice.active {
                continue;
            }
            let Some(sample) = voice.sample.and_then(|i| module.samples.get(i as usize)) else {
                voice.silence();
                continue;
            };
            let frames = voice.frequency as f64 * pitch_factor * seconds;
            if !advance_position(voice, sample, frames) {
                voice.silence();
            }
            voice.fade_in_pending = false;
            voice.snap_gain = true;
        }
    }
}
