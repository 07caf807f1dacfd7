//! Per-channel voice state
//!
//! One [`Voice`] per pattern channel: sample playback position, volume and
//! panning, pitch, modulation, envelope cursors and effect memory. The
//! engine updates voices at tick rate; the mixer only reads the per-tick
//! outputs (`frequency`, `gain`, `pan`) and the declick state.

use nether_tracker::{TrackerInstrument, TrackerNote, VolumeEffect};

/// Fadeout level of a voice that is not fading
pub const FADEOUT_MAX: u16 = 65535;

/// Envelope cursor data copied from the instrument when a note starts
#[derive(Clone, Copy, Default, Debug)]
pub struct EnvelopeState {
    pub enabled: bool,
    pub pos: u16,
    pub sustain_tick: Option<u16>,
    pub loop_ticks: Option<(u16, u16)>,
    pub last_tick: u16,
}

impl EnvelopeState {
    fn from_instrument(envelope: Option<&nether_tracker::TrackerEnvelope>) -> Self {
        match envelope {
            Some(env) if env.is_enabled() => Self {
                enabled: true,
                pos: 0,
                sustain_tick: env.sustain_tick(),
                loop_ticks: env.loop_ticks(),
                last_tick: env.last_tick(),
            },
            _ => Self::default(),
        }
    }

    /// Move one tick forward, holding at the sustain point until key-off
    pub fn advance(&mut self, key_off: bool) {
        if !self.enabled {
            return;
        }
        if !key_off && self.sustain_tick == Some(self.pos) {
            return;
        }
        if self.pos < self.last_tick {
            self.pos += 1;
        }
        if let Some((loop_start, loop_end)) = self.loop_ticks
            && self.pos >= loop_end
            && (key_off || self.sustain_tick != Some(self.pos))
        {
            self.pos = loop_start;
        }
    }
}

/// Per-channel playback state
#[derive(Clone, Default, Debug)]
pub struct Voice {
    // Sample playback
    /// Index into `TrackerModule::samples` of the playing sample
    pub sample: Option<u16>,
    /// Fractional frame position
    pub position: f64,
    /// 1 forward, -1 backward (ping-pong loops)
    pub direction: i8,
    /// Voice produces sound
    pub active: bool,
    /// Key-off has been triggered (release phase)
    pub key_off: bool,
    /// Current instrument (1-based, 0 = none)
    pub instrument: u8,
    /// Last note triggered on this channel
    pub note: u8,

    // Volume
    /// Channel volume (0.0-1.0)
    pub volume: f32,
    /// Tremolo offset for the current tick
    pub volume_offset: f32,
    /// Fadeout level after key-off (0-65535)
    pub fadeout: u16,
    /// Amount subtracted from `fadeout` per tick after key-off
    pub fadeout_rate: u16,
    pub volume_envelope: EnvelopeState,

    // Panning
    /// Current panning (-1.0 = left, 0 = center, 1.0 = right)
    pub panning: f32,
    pub panning_envelope: EnvelopeState,

    // Pitch
    /// Current period (linear or Amiga units, per module)
    pub period: f32,
    /// Vibrato offset for the current tick
    pub period_offset: f32,
    /// Target period for tone portamento
    pub target_period: f32,
    /// Tone portamento speed (memory)
    pub porta_speed: u8,
    /// Finetune of the playing sample (1/128 semitone)
    pub finetune: i8,
    /// Relative note of the playing sample
    pub relative_note: i8,
    /// Arpeggio semitone offset for the current tick
    pub arpeggio_offset: u8,
    /// E3x: round tone portamento to semitones
    pub glissando: bool,

    // Vibrato
    pub vibrato_pos: u8,
    pub vibrato_speed: u8,
    pub vibrato_depth: u8,
    pub vibrato_waveform: u8,

    // Tremolo
    pub tremolo_pos: u8,
    pub tremolo_speed: u8,
    pub tremolo_depth: u8,
    pub tremolo_waveform: u8,

    // Effect memory
    pub last_porta_up: u8,
    pub last_porta_down: u8,
    pub last_fine_porta_up: u8,
    pub last_fine_porta_down: u8,
    pub last_extra_fine_porta_up: u8,
    pub last_extra_fine_porta_down: u8,
    pub last_volume_slide: u8,
    pub last_fine_volume_up: u8,
    pub last_fine_volume_down: u8,
    pub last_sample_offset: u8,
    pub last_panning_slide: u8,
    pub last_multi_retrig: u8,
    pub last_tremor: u8,

    // Per-row effect state (reset at row start)
    pub arpeggio_note1: u8,
    pub arpeggio_note2: u8,
    pub volume_slide_active: bool,
    pub porta_up_active: bool,
    pub porta_down_active: bool,
    pub tone_porta_active: bool,
    pub vibrato_active: bool,
    pub tremolo_active: bool,
    pub arpeggio_active: bool,
    pub panning_slide_active: bool,
    pub tremor_active: bool,
    pub multi_retrig_active: bool,
    /// E9x interval in ticks (0 = off)
    pub retrigger_ticks: u8,
    pub note_cut_tick: Option<u8>,
    pub key_off_tick: Option<u8>,
    /// EDx: tick and cell to trigger later in the row
    pub note_delay_tick: Option<u8>,
    pub delayed_cell: Option<TrackerNote>,
    /// Volume column effect applied on non-zero ticks
    pub vol_col: VolumeEffect,

    // Tremor and multi-retrig counters (survive across rows)
    pub tremor_counter: u8,
    pub tremor_mute: bool,
    pub retrig_counter: u8,

    // Auto-vibrato (copied from the instrument on note start)
    pub auto_vibrato_pos: u8,
    pub auto_vibrato_ticks: u16,
    pub auto_vibrato_type: u8,
    pub auto_vibrato_depth: u8,
    pub auto_vibrato_rate: u8,
    pub auto_vibrato_sweep: u8,

    // Per-tick outputs read by the mixer
    /// Playback rate in Hz before the pitch factor
    pub frequency: f32,
    /// Final volume including envelopes, fadeout and global volume
    pub gain: f32,
    /// Final panning including the panning envelope
    pub pan: f32,
    /// Jump straight to the next gains instead of ramping
    pub snap_gain: bool,

    // Mixer gain ramp
    pub gain_left: f32,
    pub gain_right: f32,
    pub target_left: f32,
    pub target_right: f32,
    pub ramp_step_left: f32,
    pub ramp_step_right: f32,
    pub ramp_remaining: u32,

    // Declick fades
    pub fade_out_remaining: u32,
    pub fade_out_length: u32,
    pub fade_in_remaining: u32,
    pub fade_in_length: u32,
    /// A note started; the mixer arms the fade-in on its next pass
    pub fade_in_pending: bool,
    /// Last produced frame, used for crossfades
    pub prev_sample: f32,
}

impl Voice {
    /// Reset to a silent voice
    pub fn reset(&mut self) {
        *self = Self::default();
        self.direction = 1;
        self.fadeout = FADEOUT_MAX;
        self.snap_gain = true;
    }

    /// Stop producing sound, keeping effect memory
    pub fn silence(&mut self) {
        self.active = false;
        self.prev_sample = 0.0;
        self.fade_out_remaining = 0;
        self.fade_in_remaining = 0;
        self.fade_in_pending = false;
    }

    /// Start a sample from the beginning at `period`
    pub fn trigger(&mut self, sample: u16, period: f32, instrument: Option<&TrackerInstrument>) {
        self.sample = Some(sample);
        self.active = true;
        self.key_off = false;
        self.position = 0.0;
        self.direction = 1;
        self.period = period;
        self.target_period = period;
        self.fadeout = FADEOUT_MAX;
        self.fade_out_remaining = 0;
        // prev_sample is kept for the crossfade
        self.fade_in_pending = true;

        if self.vibrato_waveform < 4 {
            self.vibrato_pos = 0;
        }
        if self.tremolo_waveform < 4 {
            self.tremolo_pos = 0;
        }
        self.tremor_counter = 0;
        self.tremor_mute = false;
        self.retrig_counter = 0;

        self.auto_vibrato_pos = 0;
        self.auto_vibrato_ticks = 0;
        self.restart_envelopes(instrument);
        if let Some(instr) = instrument {
            self.fadeout_rate = instr.fadeout;
            self.auto_vibrato_type = instr.auto_vibrato_type;
            self.auto_vibrato_depth = instr.auto_vibrato_depth;
            self.auto_vibrato_rate = instr.auto_vibrato_rate;
            self.auto_vibrato_sweep = instr.auto_vibrato_sweep;
        } else {
            self.fadeout_rate = 0;
            self.auto_vibrato_depth = 0;
        }
    }

    /// Rewind envelopes and fadeout, as an instrument number without a note does
    pub fn restart_envelopes(&mut self, instrument: Option<&TrackerInstrument>) {
        self.key_off = false;
        self.fadeout = FADEOUT_MAX;
        self.volume_envelope =
            EnvelopeState::from_instrument(instrument.and_then(|i| i.volume_envelope.as_ref()));
        self.panning_envelope =
            EnvelopeState::from_instrument(instrument.and_then(|i| i.panning_envelope.as_ref()));
    }

    /// Trigger key-off (release)
    ///
    /// Without a volume envelope there is no release phase and the note
    /// goes silent at once.
    pub fn trigger_key_off(&mut self) {
        self.key_off = true;
        if !self.volume_envelope.enabled {
            self.volume = 0.0;
        }
    }

    /// Reset per-row effect activity (called at the start of each row)
    ///
    /// Effect memory persists; an effect only runs on rows that name it.
    pub fn reset_row_effects(&mut self) {
        self.volume_slide_active = false;
        self.porta_up_active = false;
        self.porta_down_active = false;
        self.tone_porta_active = false;
        self.vibrato_active = false;
        self.tremolo_active = false;
        self.arpeggio_active = false;
        self.panning_slide_active = false;
        self.tremor_active = false;
        self.multi_retrig_active = false;

        self.retrigger_ticks = 0;
        self.note_cut_tick = None;
        self.key_off_tick = None;
        self.note_delay_tick = None;
        self.delayed_cell = None;
        self.vol_col = VolumeEffect::None;

        self.arpeggio_note1 = 0;
        self.arpeggio_note2 = 0;
        self.arpeggio_offset = 0;
    }

    /// Advance envelopes and fadeout by one tick
    pub fn advance_envelopes(&mut self) {
        self.volume_envelope.advance(self.key_off);
        self.panning_envelope.advance(self.key_off);

        if self.key_off && self.volume_envelope.enabled {
            self.fadeout = self.fadeout.saturating_sub(self.fadeout_rate);
        }
    }

    /// Fadeout reached zero after key-off
    pub fn faded_out(&self) -> bool {
        self.key_off && self.volume_envelope.enabled && self.fadeout == 0
    }
}
