//! Instrument data structures and envelopes

use crate::NUM_NOTES;

/// Unified tracker instrument
#[derive(Debug, Clone)]
pub struct TrackerInstrument {
    /// Instrument name
    pub name: String,
    /// Note→sample mapping (96 entries, indices into `TrackerModule::samples`)
    pub sample_map: [Option<u16>; NUM_NOTES],
    /// Volume envelope
    pub volume_envelope: Option<TrackerEnvelope>,
    /// Panning envelope
    pub panning_envelope: Option<TrackerEnvelope>,
    /// Fadeout speed, subtracted from a 16-bit level every tick after key-off
    pub fadeout: u16,

    // =========================================================================
    // Auto-vibrato settings (applied automatically to every note)
    // =========================================================================
    /// Auto-vibrato waveform (0=sine, 1=square, 2=ramp down, 3=ramp up)
    pub auto_vibrato_type: u8,
    /// Auto-vibrato sweep (ticks to reach full depth)
    pub auto_vibrato_sweep: u8,
    /// Auto-vibrato depth
    pub auto_vibrato_depth: u8,
    /// Auto-vibrato rate (speed)
    pub auto_vibrato_rate: u8,
}

impl Default for TrackerInstrument {
    fn default() -> Self {
        Self {
            name: String::new(),
            sample_map: [None; NUM_NOTES],
            volume_envelope: None,
            panning_envelope: None,
            fadeout: 0,
            auto_vibrato_type: 0,
            auto_vibrato_sweep: 0,
            auto_vibrato_depth: 0,
            auto_vibrato_rate: 0,
        }
    }
}

impl TrackerInstrument {
    /// Instrument that plays one sample over the whole keyboard
    pub fn single_sample(name: impl Into<String>, sample: u16) -> Self {
        Self {
            name: name.into(),
            sample_map: [Some(sample); NUM_NOTES],
            ..Default::default()
        }
    }

    /// Get the sample index for a given note (1-96)
    pub fn sample_for_note(&self, note: u8) -> Option<u16> {
        let index = (note as usize).checked_sub(1)?;
        self.sample_map.get(index).copied().flatten()
    }
}

/// Unified envelope
#[derive(Debug, Clone)]
pub struct TrackerEnvelope {
    /// Envelope points: (tick, value 0-64)
    ///
    /// Panning envelopes are centered on 32.
    pub points: Vec<(u16, u8)>,
    /// Loop begin point index
    pub loop_begin: u8,
    /// Loop end point index
    pub loop_end: u8,
    /// Sustain point index
    pub sustain_point: u8,
    /// Envelope flags
    pub flags: EnvelopeFlags,
}

impl Default for TrackerEnvelope {
    fn default() -> Self {
        Self {
            points: vec![(0, 64), (100, 64)],
            loop_begin: 0,
            loop_end: 0,
            sustain_point: 0,
            flags: EnvelopeFlags::ENABLED,
        }
    }
}

impl TrackerEnvelope {
    /// Check if envelope is enabled
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(EnvelopeFlags::ENABLED) && !self.points.is_empty()
    }

    /// Check if envelope has loop
    pub fn has_loop(&self) -> bool {
        self.flags.contains(EnvelopeFlags::LOOP)
    }

    /// Check if envelope has a sustain point
    pub fn has_sustain(&self) -> bool {
        self.flags.contains(EnvelopeFlags::SUSTAIN)
    }

    /// Tick of the sustain point
    pub fn sustain_tick(&self) -> Option<u16> {
        if !self.has_sustain() {
            return None;
        }
        self.points.get(self.sustain_point as usize).map(|&(x, _)| x)
    }

    /// Tick range of the loop (start, end)
    pub fn loop_ticks(&self) -> Option<(u16, u16)> {
        if !self.has_loop() {
            return None;
        }
        let start = self.points.get(self.loop_begin as usize)?.0;
        let end = self.points.get(self.loop_end as usize)?.0;
        (end >= start).then_some((start, end))
    }

    /// Tick of the last point
    pub fn last_tick(&self) -> u16 {
        self.points.last().map(|&(x, _)| x).unwrap_or(0)
    }

    /// Get interpolated value at a given tick
    pub fn value_at(&self, tick: u16) -> f32 {
        let Some(&(first_x, first_y)) = self.points.first() else {
            return 64.0;
        };
        if tick <= first_x {
            return first_y as f32;
        }

        for pair in self.points.windows(2) {
            let (x1, y1) = pair[0];
            let (x2, y2) = pair[1];

            if tick >= x1 && tick < x2 {
                let dx = (x2 - x1) as f32;
                let dy = y2 as f32 - y1 as f32;
                let t = (tick - x1) as f32 / dx;
                return y1 as f32 + dy * t;
            }
        }

        // Past the last point
        self.points.last().map(|&(_, y)| y as f32).unwrap_or(64.0)
    }
}

/// Envelope flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvelopeFlags(u8);

impl EnvelopeFlags {
    pub const ENABLED: Self = Self(0x01);
    pub const SUSTAIN: Self = Self(0x02);
    pub const LOOP: Self = Self(0x04);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for EnvelopeFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
