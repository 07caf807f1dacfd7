//! Effect processing at tick 0 (row start)

use nether_tracker::{TrackerEffect, TrackerModule, TrackerNote, VolumeEffect};

use super::{CHANNEL_VOLUME_MAX, Engine, pan_from_u8};

/// Resolve a parameter against its memory slot
///
/// Zero reuses the remembered value when `memory` is set; otherwise zero
/// is taken literally.
fn recall(slot: &mut u8, param: u8, memory: bool) -> u8 {
    if param != 0 || !memory {
        *slot = param;
    }
    *slot
}

/// Signed finetune (1/128 semitone) from an E5x nibble
fn finetune_from_nibble(value: u8, xm: bool) -> i8 {
    let value = value & 0x0F;
    if xm {
        // FT2: 8 is centered
        ((value as i16 - 8) * 16) as i8
    } else {
        // ProTracker: signed nibble
        (((value << 4) as i8) >> 4) * 16
    }
}

impl Engine {
    /// Volume column, tick 0 part
    pub(super) fn process_volume_column_tick0(&mut self, ch: usize, effect: VolumeEffect) {
        let voice = &mut self.voices[ch];
        match effect {
            VolumeEffect::None => {}
            VolumeEffect::SetVolume(vol) => {
                voice.volume = vol.min(64) as f32 / CHANNEL_VOLUME_MAX;
            }
            VolumeEffect::FineDown(val) => {
                voice.volume = (voice.volume - val as f32 / CHANNEL_VOLUME_MAX).max(0.0);
            }
            VolumeEffect::FineUp(val) => {
                voice.volume = (voice.volume + val as f32 / CHANNEL_VOLUME_MAX).min(1.0);
            }
            VolumeEffect::VibratoSpeed(speed) => {
                if speed != 0 {
                    voice.vibrato_speed = speed;
                }
            }
            VolumeEffect::VibratoDepth(depth) => {
                if depth != 0 {
                    voice.vibrato_depth = depth;
                }
                voice.vibrato_active = true;
            }
            VolumeEffect::SetPanning(pan) => voice.panning = pan_from_u8(pan),
            VolumeEffect::TonePortamento(speed) => {
                if speed != 0 {
                    voice.porta_speed = speed << 4;
                }
                voice.tone_porta_active = true;
            }
            VolumeEffect::SlideDown(_)
            | VolumeEffect::SlideUp(_)
            | VolumeEffect::PanSlideLeft(_)
            | VolumeEffect::PanSlideRight(_) => voice.vol_col = effect,
        }
    }

    /// Effect column, tick 0 part
    pub(super) fn process_effect_tick0(
        &mut self,
        module: &TrackerModule,
        ch: usize,
        cell: &TrackerNote,
        triggered: bool,
    ) {
        let memory = self.effect_memory;
        let slide_unit = self.slide_unit();
        let extra_fine_unit = self.extra_fine_unit();

        match cell.effect {
            TrackerEffect::None => {}

            // Flow and timing belong to the sequencer
            TrackerEffect::SetSpeed(_)
            | TrackerEffect::SetTempo(_)
            | TrackerEffect::PositionJump(_)
            | TrackerEffect::PatternBreak(_)
            | TrackerEffect::PatternDelay(_)
            | TrackerEffect::PatternLoop(_)
            | TrackerEffect::NoteDelay(_) => {}

            // Volume
            TrackerEffect::SetVolume(vol) => {
                self.voices[ch].volume = vol.min(64) as f32 / CHANNEL_VOLUME_MAX;
            }
            TrackerEffect::VolumeSlide { up, down }
            | TrackerEffect::TonePortaVolSlide {
                vol_up: up,
                vol_down: down,
            }
            | TrackerEffect::VibratoVolSlide {
                vol_up: up,
                vol_down: down,
            } => {
                let voice = &mut self.voices[ch];
                recall(&mut voice.last_volume_slide, (up << 4) | down, memory);
                voice.volume_slide_active = true;
                match cell.effect {
                    TrackerEffect::TonePortaVolSlide { .. } => voice.tone_porta_active = true,
                    TrackerEffect::VibratoVolSlide { .. } => voice.vibrato_active = true,
                    _ => {}
                }
            }
            TrackerEffect::FineVolumeUp(val) => {
                let voice = &mut self.voices[ch];
                let val = recall(&mut voice.last_fine_volume_up, val, memory);
                voice.volume = (voice.volume + val as f32 / CHANNEL_VOLUME_MAX).min(1.0);
            }
            TrackerEffect::FineVolumeDown(val) => {
                let voice = &mut self.voices[ch];
                let val = recall(&mut voice.last_fine_volume_down, val, memory);
                voice.volume = (voice.volume - val as f32 / CHANNEL_VOLUME_MAX).max(0.0);
            }
            TrackerEffect::SetGlobalVolume(vol) => self.set_global_volume(vol),
            TrackerEffect::GlobalVolumeSlide { up, down } => {
                recall(&mut self.last_global_vol_slide, (up << 4) | down, memory);
                self.global_slide_active = true;
            }
            TrackerEffect::Tremor { ontime, offtime } => {
                let voice = &mut self.voices[ch];
                recall(&mut voice.last_tremor, (ontime << 4) | offtime, memory);
                voice.tremor_active = true;
            }

            // Pitch
            TrackerEffect::PortamentoUp(val) => {
                let voice = &mut self.voices[ch];
                recall(&mut voice.last_porta_up, val, memory);
                voice.porta_up_active = true;
            }
            TrackerEffect::PortamentoDown(val) => {
                let voice = &mut self.voices[ch];
                recall(&mut voice.last_porta_down, val, memory);
                voice.porta_down_active = true;
            }
            TrackerEffect::FinePortaUp(val) => {
                let val = recall(&mut self.voices[ch].last_fine_porta_up, val, memory);
                let period = self.slide_period(self.voices[ch].period, -(val as f32) * slide_unit);
                self.voices[ch].period = period;
            }
            TrackerEffect::FinePortaDown(val) => {
                let val = recall(&mut self.voices[ch].last_fine_porta_down, val, memory);
                let period = self.slide_period(self.voices[ch].period, val as f32 * slide_unit);
                self.voices[ch].period = period;
            }
            TrackerEffect::ExtraFinePortaUp(val) => {
                let val = recall(&mut self.voices[ch].last_extra_fine_porta_up, val, memory);
                let period =
                    self.slide_period(self.voices[ch].period, -(val as f32) * extra_fine_unit);
                self.voices[ch].period = period;
            }
            TrackerEffect::ExtraFinePortaDown(val) => {
                let val = recall(&mut self.voices[ch].last_extra_fine_porta_down, val, memory);
                let period = self.slide_period(self.voices[ch].period, val as f32 * extra_fine_unit);
                self.voices[ch].period = period;
            }
            TrackerEffect::TonePortamento(speed) => {
                let voice = &mut self.voices[ch];
                if speed != 0 {
                    voice.porta_speed = speed;
                }
                voice.tone_porta_active = true;
            }
            TrackerEffect::Arpeggio { note1, note2 } => {
                let voice = &mut self.voices[ch];
                voice.arpeggio_active = true;
                voice.arpeggio_note1 = note1;
                voice.arpeggio_note2 = note2;
            }
            TrackerEffect::SetFinetune(value) => {
                let finetune = finetune_from_nibble(value, self.effect_memory);
                self.voices[ch].finetune = finetune;
                if triggered {
                    let voice = &self.voices[ch];
                    let period = self.note_period(Self::real_note(voice.note, voice.relative_note), finetune);
                    let voice = &mut self.voices[ch];
                    voice.period = period;
                    voice.target_period = period;
                }
            }
            TrackerEffect::SetGlissando(on) => self.voices[ch].glissando = on,

            // Modulation
            TrackerEffect::Vibrato { speed, depth } => {
                let voice = &mut self.voices[ch];
                if speed != 0 {
                    voice.vibrato_speed = speed;
                }
                if depth != 0 {
                    voice.vibrato_depth = depth;
                }
                voice.vibrato_active = true;
            }
            TrackerEffect::Tremolo { speed, depth } => {
                let voice = &mut self.voices[ch];
                if speed != 0 {
                    voice.tremolo_speed = speed;
                }
                if depth != 0 {
                    voice.tremolo_depth = depth;
                }
                voice.tremolo_active = true;
            }
            TrackerEffect::VibratoWaveform(waveform) => self.voices[ch].vibrato_waveform = waveform & 0x07,
            TrackerEffect::TremoloWaveform(waveform) => self.voices[ch].tremolo_waveform = waveform & 0x07,

            // Panning
            TrackerEffect::SetPanning(pan) => self.voices[ch].panning = pan_from_u8(pan),
            TrackerEffect::PanningSlide { left, right } => {
                let voice = &mut self.voices[ch];
                recall(&mut voice.last_panning_slide, (left << 4) | right, memory);
                voice.panning_slide_active = true;
            }

            // Sample
            TrackerEffect::SampleOffset(offset) => {
                let voice = &mut self.voices[ch];
                let offset = recall(&mut voice.last_sample_offset, offset, true);
                if triggered {
                    let frames = offset as usize * 256;
                    let len = voice
                        .sample
                        .and_then(|i| module.samples.get(i as usize))
                        .map_or(0, |s| s.len());
                    if frames >= len {
                        voice.silence();
                    } else {
                        voice.position = frames as f64;
                    }
                }
            }
            TrackerEffect::Retrigger(ticks) => self.voices[ch].retrigger_ticks = ticks,
            TrackerEffect::MultiRetrig { ticks, volume } => {
                let voice = &mut self.voices[ch];
                // Each nibble has its own memory
                let mut param = voice.last_multi_retrig;
                if ticks != 0 || !memory {
                    param = (param & 0xF0) | (ticks & 0x0F);
                }
                if volume != 0 || !memory {
                    param = (param & 0x0F) | (volume << 4);
                }
                voice.last_multi_retrig = param;
                voice.multi_retrig_active = true;
            }
            TrackerEffect::NoteCut(tick) => {
                let voice = &mut self.voices[ch];
                if tick == 0 {
                    voice.volume = 0.0;
                } else {
                    voice.note_cut_tick = Some(tick);
                }
            }

            // Instrument
            TrackerEffect::SetEnvelopePosition(pos) => {
                let voice = &mut self.voices[ch];
                let pos = pos as u16;
                voice.volume_envelope.pos = pos.min(voice.volume_envelope.last_tick);
                voice.panning_envelope.pos = pos.min(voice.panning_envelope.last_tick);
            }
            TrackerEffect::KeyOff(tick) => {
                let voice = &mut self.voices[ch];
                if tick == 0 {
                    voice.trigger_key_off();
                } else {
                    voice.key_off_tick = Some(tick);
                }
            }
        }
    }
}
