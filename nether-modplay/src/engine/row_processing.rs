//! Row and note processing at tick 0

use nether_tracker::{TrackerEffect, TrackerModule, TrackerNote, TrackerPattern, VolumeEffect};

use super::{CHANNEL_VOLUME_MAX, Engine, pan_from_u8};

impl Engine {
    /// Process tick 0 of a row
    pub(crate) fn process_row(&mut self, module: &TrackerModule, pattern: &TrackerPattern, row: u16) {
        self.global_slide_active = false;

        for ch in 0..self.num_channels {
            self.voices[ch].reset_row_effects();

            let Some(cell) = pattern.get_note(row, ch as u8).copied() else {
                continue;
            };

            if let TrackerEffect::NoteDelay(ticks) = cell.effect
                && ticks > 0
            {
                let voice = &mut self.voices[ch];
                voice.note_delay_tick = Some(ticks);
                voice.delayed_cell = Some(cell);
                continue;
            }

            self.process_cell(module, ch, &cell);
        }

        for voice in self.voices[..self.num_channels].iter_mut() {
            if !voice.vibrato_active {
                voice.period_offset = 0.0;
            }
            if !voice.tremolo_active {
                voice.volume_offset = 0.0;
            }
        }

        self.finish_tick(module);
    }

    /// Apply one cell: note, instrument, volume column and effect
    pub(crate) fn process_cell(&mut self, module: &TrackerModule, ch: usize, cell: &TrackerNote) {
        let tone_porta = matches!(
            cell.effect,
            TrackerEffect::TonePortamento(_) | TrackerEffect::TonePortaVolSlide { .. }
        ) || matches!(cell.vol_effect, VolumeEffect::TonePortamento(_));

        if cell.has_instrument() {
            self.voices[ch].instrument = cell.instrument;
        }

        let mut triggered = false;
        if cell.has_note() {
            if tone_porta && self.voices[ch].active {
                self.set_porta_target(ch, cell.note);
            } else {
                triggered = self.trigger_note(module, ch, cell.note);
            }
        } else if cell.is_note_off() {
            self.voices[ch].trigger_key_off();
        } else if cell.is_note_cut() {
            self.voices[ch].volume = 0.0;
        }

        // An instrument number restores the sample's default volume and panning
        if cell.has_instrument() && !cell.is_note_off() {
            let voice = &mut self.voices[ch];
            let instrument = module.instrument(cell.instrument);
            if let Some(sample) = voice.sample.and_then(|i| module.samples.get(i as usize)) {
                voice.volume = sample.default_volume.min(64) as f32 / CHANNEL_VOLUME_MAX;
                if let Some(pan) = sample.default_pan {
                    voice.panning = pan_from_u8(pan);
                }
            }
            if voice.active && !triggered && instrument.is_some() {
                voice.restart_envelopes(instrument);
            }
        }

        self.process_volume_column_tick0(ch, cell.vol_effect);
        self.process_effect_tick0(module, ch, cell, triggered);
    }

    /// Start a note on a channel
    ///
    /// Returns false (and silences the channel) when the current instrument
    /// has no playable sample for the note.
    pub(crate) fn trigger_note(&mut self, module: &TrackerModule, ch: usize, note: u8) -> bool {
        let instrument = module.instrument(self.voices[ch].instrument);
        let resolved = instrument
            .and_then(|instr| instr.sample_for_note(note))
            .and_then(|index| module.samples.get(index as usize).map(|s| (index, s)))
            .filter(|(_, sample)| !sample.is_empty());

        let Some((index, sample)) = resolved else {
            let voice = &mut self.voices[ch];
            voice.note = note;
            voice.silence();
            return false;
        };

        let period = self.note_period(Self::real_note(note, sample.relative_note), sample.finetune);
        let voice = &mut self.voices[ch];
        voice.note = note;
        voice.finetune = sample.finetune;
        voice.relative_note = sample.relative_note;
        voice.trigger(index, period, instrument);
        true
    }

    /// Point tone portamento at a note instead of retriggering
    fn set_porta_target(&mut self, ch: usize, note: u8) {
        let (relative_note, finetune) = {
            let voice = &self.voices[ch];
            (voice.relative_note, voice.finetune)
        };
        let target = self.note_period(Self::real_note(note, relative_note), finetune);
        let voice = &mut self.voices[ch];
        voice.note = note;
        voice.target_period = target;
    }
}
