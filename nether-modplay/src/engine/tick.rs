//! Per-tick effect processing and per-tick voice outputs

use nether_tracker::{TrackerModule, VolumeEffect};

use super::{CHANNEL_VOLUME_MAX, Engine, PAN_ENVELOPE_CENTER, VOLUME_ENVELOPE_MAX, VOLUME_FADEOUT_MAX};
use crate::utils::{auto_vibrato_value, get_waveform_value};

/// Vibrato period offset per unit of depth at full waveform (linear periods)
const LINEAR_VIBRATO_SCALE: f32 = 255.0 / 32.0;
/// Vibrato period offset per unit of depth at full waveform (Amiga periods)
const AMIGA_VIBRATO_SCALE: f32 = 255.0 / 128.0;

/// Multi-retrig volume change, indexed by the high nibble of Rxy
fn retrig_volume(volume: f32, mode: u8) -> f32 {
    let step = 1.0 / CHANNEL_VOLUME_MAX;
    let next = match mode {
        1 => volume - step,
        2 => volume - 2.0 * step,
        3 => volume - 4.0 * step,
        4 => volume - 8.0 * step,
        5 => volume - 16.0 * step,
        6 => volume * (2.0 / 3.0),
        7 => volume * 0.5,
        9 => volume + step,
        10 => volume + 2.0 * step,
        11 => volume + 4.0 * step,
        12 => volume + 8.0 * step,
        13 => volume + 16.0 * step,
        14 => volume * 1.5,
        15 => volume * 2.0,
        _ => volume,
    };
    next.clamp(0.0, 1.0)
}

impl Engine {
    /// Process a tick after tick 0 of a row
    ///
    /// `tick` counts from the start of the row; pattern-delay repeats see
    /// multiples of `speed` and only run continuous processing there.
    pub(crate) fn process_tick(&mut self, module: &TrackerModule, tick: u32, speed: u16) {
        let local = (tick % speed.max(1) as u32) as u8;

        for ch in 0..self.num_channels {
            if self.voices[ch].note_delay_tick == Some(local) {
                self.voices[ch].note_delay_tick = None;
                if let Some(cell) = self.voices[ch].delayed_cell.take() {
                    self.process_cell(module, ch, &cell);
                }
            }
            if local == 0 {
                continue;
            }
            self.process_channel_tick(ch, local);
        }

        if self.global_slide_active && local != 0 {
            let up = (self.last_global_vol_slide >> 4) as f32 / CHANNEL_VOLUME_MAX;
            let down = (self.last_global_vol_slide & 0x0F) as f32 / CHANNEL_VOLUME_MAX;
            if up > 0.0 {
                self.global_volume = (self.global_volume + up).min(1.0);
            } else if down > 0.0 {
                self.global_volume = (self.global_volume - down).max(0.0);
            }
        }

        self.finish_tick(module);
    }

    fn process_channel_tick(&mut self, ch: usize, tick: u8) {
        let slide_unit = self.slide_unit();
        let vibrato_scale = if self.linear {
            LINEAR_VIBRATO_SCALE
        } else {
            AMIGA_VIBRATO_SCALE
        };

        // Period slides need &self for the clamp rules
        let (porta_up, porta_down) = {
            let voice = &self.voices[ch];
            (
                voice.porta_up_active.then_some(voice.last_porta_up),
                voice.porta_down_active.then_some(voice.last_porta_down),
            )
        };
        if let Some(speed) = porta_up {
            let period = self.slide_period(self.voices[ch].period, -(speed as f32) * slide_unit);
            self.voices[ch].period = period;
        }
        if let Some(speed) = porta_down {
            let period = self.slide_period(self.voices[ch].period, speed as f32 * slide_unit);
            self.voices[ch].period = period;
        }

        let voice = &mut self.voices[ch];

        // Arpeggio
        if voice.arpeggio_active {
            voice.arpeggio_offset = match tick % 3 {
                0 => 0,
                1 => voice.arpeggio_note1,
                _ => voice.arpeggio_note2,
            };
        }

        // Volume slide
        if voice.volume_slide_active && voice.last_volume_slide != 0 {
            let up = (voice.last_volume_slide >> 4) as f32 / CHANNEL_VOLUME_MAX;
            let down = (voice.last_volume_slide & 0x0F) as f32 / CHANNEL_VOLUME_MAX;
            if up > 0.0 {
                voice.volume = (voice.volume + up).min(1.0);
            } else {
                voice.volume = (voice.volume - down).max(0.0);
            }
        }

        // Tone portamento
        if voice.tone_porta_active && voice.target_period > 0.0 && voice.porta_speed > 0 {
            let speed = voice.porta_speed as f32 * slide_unit;
            let diff = voice.target_period - voice.period;
            if diff.abs() <= speed {
                voice.period = voice.target_period;
            } else if diff > 0.0 {
                voice.period += speed;
            } else {
                voice.period -= speed;
            }
        }

        // Vibrato
        if voice.vibrato_active && voice.vibrato_depth > 0 {
            let wave = get_waveform_value(voice.vibrato_waveform, voice.vibrato_pos);
            voice.period_offset = wave * voice.vibrato_depth as f32 * vibrato_scale;
            voice.vibrato_pos = voice.vibrato_pos.wrapping_add(voice.vibrato_speed << 2);
        }

        // Tremolo
        if voice.tremolo_active && voice.tremolo_depth > 0 {
            let wave = get_waveform_value(voice.tremolo_waveform, voice.tremolo_pos);
            voice.volume_offset = wave * voice.tremolo_depth as f32 / 16.0;
            voice.tremolo_pos = voice.tremolo_pos.wrapping_add(voice.tremolo_speed << 2);
        }

        // Tremor: on for x+1 ticks, off for y+1 ticks
        if voice.tremor_active {
            let on = (voice.last_tremor >> 4) + 1;
            let off = (voice.last_tremor & 0x0F) + 1;
            voice.tremor_counter = voice.tremor_counter.saturating_add(1);
            if voice.tremor_mute {
                if voice.tremor_counter >= off {
                    voice.tremor_mute = false;
                    voice.tremor_counter = 0;
                }
            } else if voice.tremor_counter >= on {
                voice.tremor_mute = true;
                voice.tremor_counter = 0;
            }
        }

        // Retrigger (E9x)
        if voice.retrigger_ticks > 0 && tick.is_multiple_of(voice.retrigger_ticks) && voice.sample.is_some() {
            voice.position = 0.0;
            voice.direction = 1;
            voice.active = true;
            voice.fade_in_pending = true;
        }

        // Multi retrig (Rxy)
        if voice.multi_retrig_active {
            let interval = voice.last_multi_retrig & 0x0F;
            voice.retrig_counter = voice.retrig_counter.saturating_add(1);
            if interval > 0 && voice.retrig_counter >= interval && voice.sample.is_some() {
                voice.retrig_counter = 0;
                voice.position = 0.0;
                voice.direction = 1;
                voice.active = true;
                voice.fade_in_pending = true;
                voice.volume = retrig_volume(voice.volume, voice.last_multi_retrig >> 4);
            }
        }

        // Panning slide
        if voice.panning_slide_active && voice.last_panning_slide != 0 {
            let left = (voice.last_panning_slide >> 4) as f32;
            let right = (voice.last_panning_slide & 0x0F) as f32;
            let delta = if left > 0.0 { -left } else { right };
            voice.panning = (voice.panning + delta * 2.0 / 255.0).clamp(-1.0, 1.0);
        }

        // Note cut
        if voice.note_cut_tick == Some(tick) {
            voice.volume = 0.0;
        }

        // Key off timing
        if voice.key_off_tick == Some(tick) {
            voice.trigger_key_off();
        }

        // Volume column effects (per-tick)
        match voice.vol_col {
            VolumeEffect::SlideDown(val) => {
                voice.volume = (voice.volume - val as f32 / CHANNEL_VOLUME_MAX).max(0.0);
            }
            VolumeEffect::SlideUp(val) => {
                voice.volume = (voice.volume + val as f32 / CHANNEL_VOLUME_MAX).min(1.0);
            }
            VolumeEffect::PanSlideLeft(val) => {
                voice.panning = (voice.panning - val as f32 * 2.0 / 255.0).clamp(-1.0, 1.0);
            }
            VolumeEffect::PanSlideRight(val) => {
                voice.panning = (voice.panning + val as f32 * 2.0 / 255.0).clamp(-1.0, 1.0);
            }
            _ => {}
        }
    }

    /// Compute the per-tick outputs, then advance envelopes and auto-vibrato
    pub(crate) fn finish_tick(&mut self, module: &TrackerModule) {
        let global_volume = self.global_volume;
        let linear = self.linear;

        for ch in 0..self.num_channels {
            if !self.voices[ch].active {
                self.voices[ch].gain = 0.0;
                continue;
            }

            let voice = &self.voices[ch];
            let instrument = module.instrument(voice.instrument);

            let env_volume = match instrument.and_then(|i| i.volume_envelope.as_ref()) {
                Some(env) if voice.volume_envelope.enabled => {
                    env.value_at(voice.volume_envelope.pos) / VOLUME_ENVELOPE_MAX
                }
                _ => 1.0,
            };
            let env_pan = match instrument.and_then(|i| i.panning_envelope.as_ref()) {
                Some(env) if voice.panning_envelope.enabled => {
                    (env.value_at(voice.panning_envelope.pos) - PAN_ENVELOPE_CENTER) / PAN_ENVELOPE_CENTER
                }
                _ => 0.0,
            };
            let fade = if voice.key_off && voice.volume_envelope.enabled {
                voice.fadeout as f32 / VOLUME_FADEOUT_MAX
            } else {
                1.0
            };
            let tremor = if voice.tremor_active && voice.tremor_mute { 0.0 } else { 1.0 };
            let volume = (voice.volume + voice.volume_offset).clamp(0.0, 1.0);

            let mut period = voice.period;
            if voice.glissando && voice.tone_porta_active {
                period = self.round_to_semitone(period, voice.finetune);
            }
            period += voice.period_offset;

            if voice.auto_vibrato_depth > 0 {
                let sweep = if voice.auto_vibrato_sweep > 0 {
                    (voice.auto_vibrato_ticks as f32 / voice.auto_vibrato_sweep as f32).min(1.0)
                } else {
                    1.0
                };
                let wave = auto_vibrato_value(voice.auto_vibrato_type, voice.auto_vibrato_pos);
                let scale = if linear { 1.0 } else { 0.25 };
                period += wave * voice.auto_vibrato_depth as f32 * sweep * scale;
            }

            let frequency = self.period_frequency(period.max(1.0), voice.arpeggio_offset);

            let voice = &mut self.voices[ch];
            voice.gain = volume * env_volume * fade * tremor * global_volume;
            voice.pan = (voice.panning + env_pan * (1.0 - voice.panning.abs())).clamp(-1.0, 1.0);
            voice.frequency = frequency;

            voice.auto_vibrato_pos = voice.auto_vibrato_pos.wrapping_add(voice.auto_vibrato_rate);
            voice.auto_vibrato_ticks = voice.auto_vibrato_ticks.saturating_add(1);
            voice.advance_envelopes();
            if voice.faded_out() {
                voice.silence();
            }
        }
    }
}
