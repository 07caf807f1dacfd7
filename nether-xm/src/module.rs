//! XM module data structures

use crate::SAMPLE_MAP_SIZE;

/// Parsed XM module
#[derive(Debug, Clone)]
pub struct XmModule {
    /// Module name (max 20 chars)
    pub name: String,
    /// Name of the tracker that saved the file (max 20 chars)
    pub tracker_name: String,
    /// Number of channels (1-32)
    pub num_channels: u8,
    /// Number of patterns
    pub num_patterns: u16,
    /// Number of instruments
    pub num_instruments: u16,
    /// Song length in pattern order entries
    pub song_length: u16,
    /// Restart position for looping
    pub restart_position: u16,
    /// Default speed (ticks per row)
    pub default_speed: u16,
    /// Default BPM
    pub default_bpm: u16,
    /// Use linear frequency table (vs Amiga)
    pub linear_frequency_table: bool,
    /// Pattern order table (which pattern to play in order)
    pub order_table: Vec<u8>,
    /// Pattern data
    pub patterns: Vec<XmPattern>,
    /// Instruments with their samples
    pub instruments: Vec<XmInstrument>,
    /// Recoverable problems found while parsing (truncated sample data etc.)
    pub warnings: Vec<String>,
}

impl XmModule {
    /// Get the pattern at the given order position
    pub fn pattern_at_order(&self, order: u16) -> Option<&XmPattern> {
        let pattern_idx = *self.order_table.get(order as usize)? as usize;
        self.patterns.get(pattern_idx)
    }

    /// Get total number of orders in the song
    pub fn total_orders(&self) -> u16 {
        self.song_length
    }

    /// Total number of samples across all instruments
    pub fn total_samples(&self) -> usize {
        self.instruments.iter().map(|i| i.samples.len()).sum()
    }
}

impl Default for XmModule {
    fn default() -> Self {
        Self {
            name: String::new(),
            tracker_name: String::new(),
            num_channels: 4,
            num_patterns: 0,
            num_instruments: 0,
            song_length: 0,
            restart_position: 0,
            default_speed: 6,
            default_bpm: 125,
            linear_frequency_table: true,
            order_table: Vec::new(),
            patterns: Vec::new(),
            instruments: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// XM pattern containing rows of note data
#[derive(Debug, Clone)]
pub struct XmPattern {
    /// Number of rows in this pattern (1-256)
    pub num_rows: u16,
    /// Unpacked note data: [row][channel]
    pub notes: Vec<Vec<XmNote>>,
}

impl XmPattern {
    /// Get note at specific row and channel
    pub fn get_note(&self, row: u16, channel: u8) -> Option<&XmNote> {
        self.notes.get(row as usize)?.get(channel as usize)
    }

    /// Create an empty pattern with the given dimensions
    pub fn empty(num_rows: u16, num_channels: u8) -> Self {
        let notes = (0..num_rows)
            .map(|_| vec![XmNote::default(); num_channels as usize])
            .collect();
        Self { num_rows, notes }
    }
}

/// Single note/command in a pattern
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct XmNote {
    /// Note value: 0=none, 1-96=C-0..B-7, 97=note-off
    pub note: u8,
    /// Instrument number: 0=none, 1-128=instrument
    pub instrument: u8,
    /// Volume column: 0=none, 0x10-0x50=set volume, others=effects
    pub volume: u8,
    /// Effect command (0-35)
    pub effect: u8,
    /// Effect parameter
    pub effect_param: u8,
}

impl XmNote {
    /// Check if this is a note-off
    #[inline]
    pub fn is_note_off(&self) -> bool {
        self.note == crate::NOTE_OFF
    }

    /// Check if this note triggers a new note
    #[inline]
    pub fn has_note(&self) -> bool {
        self.note >= crate::NOTE_MIN && self.note <= crate::NOTE_MAX
    }

    /// Check if this sets an instrument
    #[inline]
    pub fn has_instrument(&self) -> bool {
        self.instrument > 0
    }

    /// Check if there's an effect
    #[inline]
    pub fn has_effect(&self) -> bool {
        self.effect != 0 || self.effect_param != 0
    }

    /// True when every field is zero (packs to a single 0x80 byte)
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Get volume value if volume column contains set-volume (0x10-0x50)
    #[inline]
    pub fn get_volume(&self) -> Option<u8> {
        if (0x10..=0x50).contains(&self.volume) {
            Some(self.volume - 0x10)
        } else {
            None
        }
    }

    /// Get volume column effect if present, as (effect nibble, parameter)
    pub fn get_volume_effect(&self) -> Option<(u8, u8)> {
        if self.volume >= 0x60 {
            Some((self.volume >> 4, self.volume & 0x0F))
        } else {
            None
        }
    }

    /// Convert note number to octave and semitone
    /// Returns (octave 0-7, semitone 0-11) where semitone 0=C, 11=B
    pub fn note_to_octave_semitone(&self) -> Option<(u8, u8)> {
        if self.has_note() {
            let n = self.note - 1;
            Some((n / 12, n % 12))
        } else {
            None
        }
    }
}

/// XM instrument: header, envelopes and the samples it owns
#[derive(Debug, Clone)]
pub struct XmInstrument {
    /// Instrument name
    pub name: String,
    /// Sample index (into `samples`) for each of the 96 notes
    pub sample_map: [u8; SAMPLE_MAP_SIZE],
    /// Volume envelope
    pub volume_envelope: Option<XmEnvelope>,
    /// Panning envelope
    pub panning_envelope: Option<XmEnvelope>,
    /// Auto-vibrato type (0=sine, 1=square, 2=ramp down, 3=ramp up)
    pub vibrato_type: u8,
    /// Auto-vibrato sweep
    pub vibrato_sweep: u8,
    /// Auto-vibrato depth
    pub vibrato_depth: u8,
    /// Auto-vibrato rate
    pub vibrato_rate: u8,
    /// Volume fadeout value (0-4095)
    pub volume_fadeout: u16,
    /// Samples belonging to this instrument
    pub samples: Vec<XmSample>,
}

impl Default for XmInstrument {
    fn default() -> Self {
        Self {
            name: String::new(),
            sample_map: [0; SAMPLE_MAP_SIZE],
            volume_envelope: None,
            panning_envelope: None,
            vibrato_type: 0,
            vibrato_sweep: 0,
            vibrato_depth: 0,
            vibrato_rate: 0,
            volume_fadeout: 0,
            samples: Vec::new(),
        }
    }
}

impl XmInstrument {
    /// Sample played for a 1-based note, if the map points at an existing sample
    pub fn sample_for_note(&self, note: u8) -> Option<&XmSample> {
        let slot = *self.sample_map.get(note.checked_sub(1)? as usize)?;
        self.samples.get(slot as usize)
    }
}

/// A sample owned by an instrument
#[derive(Debug, Clone, Default)]
pub struct XmSample {
    /// Sample name
    pub name: String,
    /// Loop start (in sample frames)
    pub loop_start: u32,
    /// Loop length (in sample frames)
    pub loop_length: u32,
    /// Default volume (0-64)
    pub volume: u8,
    /// Finetune (-128 to 127, 1/128 semitone)
    pub finetune: i8,
    /// Loop type (0=none, 1=forward, 2=ping-pong)
    pub loop_type: u8,
    /// Stored as 16-bit deltas (vs 8-bit)
    pub is_16bit: bool,
    /// Default panning (0-255)
    pub panning: u8,
    /// Relative note (semitones from C-4)
    pub relative_note: i8,
    /// Decoded PCM, 8-bit samples scaled to the 16-bit range
    pub data: Vec<i16>,
}

impl XmSample {
    /// Check if this sample has a loop
    #[inline]
    pub fn has_loop(&self) -> bool {
        self.loop_type != 0 && self.loop_length > 0
    }

    /// Check if this is a ping-pong (bidirectional) loop
    #[inline]
    pub fn is_pingpong_loop(&self) -> bool {
        self.loop_type == 2
    }

    /// Get the loop end position
    #[inline]
    pub fn loop_end(&self) -> u32 {
        self.loop_start + self.loop_length
    }

    /// Playback rate of C-4 for this sample
    ///
    /// rate = 8363 × 2^((relative_note + finetune/128) / 12)
    pub fn c4_rate(&self) -> f64 {
        let semitones = self.relative_note as f64 + self.finetune as f64 / 128.0;
        8363.0 * 2.0_f64.powf(semitones / 12.0)
    }
}

/// Volume/panning envelope
#[derive(Debug, Clone, Default)]
pub struct XmEnvelope {
    /// Envelope points: (x=tick, y=value 0-64)
    pub points: Vec<(u16, u16)>,
    /// Sustain point index
    pub sustain_point: u8,
    /// Loop start point index
    pub loop_start: u8,
    /// Loop end point index
    pub loop_end: u8,
    /// Envelope is enabled
    pub enabled: bool,
    /// Sustain is enabled
    pub sustain_enabled: bool,
    /// Loop is enabled
    pub loop_enabled: bool,
}

impl XmEnvelope {
    /// Get interpolated envelope value at a given tick
    pub fn value_at(&self, tick: u16) -> u16 {
        let Some(&(_, last)) = self.points.last() else {
            return 64;
        };

        for pair in self.points.windows(2) {
            let (x1, y1) = pair[0];
            let (x2, y2) = pair[1];

            if tick >= x1 && tick < x2 {
                let dx = (x2 - x1) as f32;
                let dy = y2 as f32 - y1 as f32;
                let t = (tick - x1) as f32 / dx;
                return (y1 as f32 + dy * t) as u16;
            }
        }

        last
    }

    /// Flag byte as stored in the instrument header (bit0 on, bit1 sustain, bit2 loop)
    pub fn type_flags(&self) -> u8 {
        (self.enabled as u8) | (self.sustain_enabled as u8) << 1 | (self.loop_enabled as u8) << 2
    }

    /// Get the tick value at the sustain point
    pub fn sustain_tick(&self) -> Option<u16> {
        if self.sustain_enabled {
            self.points
                .get(self.sustain_point as usize)
                .map(|(x, _)| *x)
        } else {
            None
        }
    }

    /// Get the tick range for the loop
    pub fn loop_range(&self) -> Option<(u16, u16)> {
        if self.loop_enabled {
            let start = self.points.get(self.loop_start as usize)?.0;
            let end = self.points.get(self.loop_end as usize)?.0;
            Some((start, end))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xm_note_methods() {
        let note_off = XmNote {
            note: 97,
            ..Default::default()
        };
        assert!(note_off.is_note_off());
        assert!(!note_off.has_note());

        let note_c4 = XmNote {
            note: 49,
            instrument: 1,
            ..Default::default()
        };
        assert!(note_c4.has_note());
        assert!(note_c4.has_instrument());
        assert!(!note_c4.is_empty());
        assert_eq!(note_c4.note_to_octave_semitone(), Some((4, 0)));

        let vol_set = XmNote {
            volume: 0x30,
            ..Default::default()
        };
        assert_eq!(vol_set.get_volume(), Some(0x20));
        assert_eq!(vol_set.get_volume_effect(), None);

        let vol_slide = XmNote {
            volume: 0x63,
            ..Default::default()
        };
        assert_eq!(vol_slide.get_volume(), None);
        assert_eq!(vol_slide.get_volume_effect(), Some((6, 3)));
        assert!(XmNote::default().is_empty());
    }

    #[test]
    fn test_xm_pattern_empty() {
        let pattern = XmPattern::empty(64, 8);
        assert_eq!(pattern.num_rows, 64);
        assert_eq!(pattern.notes.len(), 64);
        assert_eq!(pattern.notes[0].len(), 8);
        assert!(pattern.get_note(63, 7).is_some());
        assert!(pattern.get_note(64, 0).is_none());
    }

    #[test]
    fn test_sample_loop_and_rate() {
        let mut sample = XmSample::default();
        assert!(!sample.has_loop());

        sample.loop_type = 1;
        sample.loop_start = 100;
        sample.loop_length = 500;
        assert!(sample.has_loop());
        assert!(!sample.is_pingpong_loop());
        assert_eq!(sample.loop_end(), 600);

        sample.loop_type = 2;
        assert!(sample.is_pingpong_loop());

        assert!((sample.c4_rate() - 8363.0).abs() < 1e-9);
        sample.relative_note = 12;
        assert!((sample.c4_rate() - 16726.0).abs() < 1e-6);
    }

    #[test]
    fn test_instrument_sample_map() {
        let mut instr = XmInstrument::default();
        instr.samples.push(XmSample {
            name: "low".into(),
            ..Default::default()
        });
        instr.samples.push(XmSample {
            name: "high".into(),
            ..Default::default()
        });
        instr.sample_map[48..].fill(1);

        assert_eq!(instr.sample_for_note(1).map(|s| s.name.as_str()), Some("low"));
        assert_eq!(instr.sample_for_note(60).map(|s| s.name.as_str()), Some("high"));
        assert!(instr.sample_for_note(0).is_none());
        assert!(instr.sample_for_note(97).is_none());
    }

    #[test]
    fn test_xm_envelope_interpolation() {
        let env = XmEnvelope {
            points: vec![(0, 64), (10, 32), (20, 0)],
            enabled: true,
            loop_enabled: true,
            loop_start: 0,
            loop_end: 1,
            ..Default::default()
        };

        assert_eq!(env.value_at(0), 64);
        assert_eq!(env.value_at(5), 48);
        assert_eq!(env.value_at(10), 32);
        assert_eq!(env.value_at(15), 16);
        assert_eq!(env.value_at(20), 0);
        assert_eq!(env.value_at(30), 0);
        assert_eq!(env.type_flags(), 0b101);
        assert_eq!(env.loop_range(), Some((0, 10)));
        assert_eq!(env.sustain_tick(), None);
    }
}
