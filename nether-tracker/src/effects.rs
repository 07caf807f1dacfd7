//! Unified tracker effect system
//!
//! Pattern effects are decoded once at load time into [`TrackerEffect`] and
//! the XM volume column into [`VolumeEffect`]. MOD and XM share the
//! ProTracker numbering for commands 0-F; [`TrackerEffect::from_protracker`]
//! decodes that common part and the XM converter adds the commands above F.
//!
//! A zero parameter on effects with memory (slides, vibrato, offsets) means
//! "reuse the last value"; the decoded effect keeps the zero and the engine
//! resolves it against channel memory.

/// Unified tracker effect (normalized from MOD/XM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerEffect {
    /// No effect
    #[default]
    None,

    // =========================================================================
    // Speed and Tempo
    // =========================================================================
    /// Set speed (ticks per row), Fxx with xx < 0x20
    SetSpeed(u8),

    /// Set tempo (BPM), Fxx with xx >= 0x20
    SetTempo(u8),

    // =========================================================================
    // Pattern Flow Control
    // =========================================================================
    /// Jump to order position, Bxx
    PositionJump(u8),

    /// Break to row in next pattern, Dxx (row already decoded from BCD)
    PatternBreak(u8),

    /// Repeat the current row x more times, EEx
    PatternDelay(u8),

    /// Pattern loop, E6x (0 sets the loop start)
    PatternLoop(u8),

    // =========================================================================
    // Volume Effects
    // =========================================================================
    /// Set volume (0-64), Cxx
    SetVolume(u8),

    /// Volume slide, Axy
    VolumeSlide { up: u8, down: u8 },

    /// Fine volume slide up, EAx
    FineVolumeUp(u8),

    /// Fine volume slide down, EBx
    FineVolumeDown(u8),

    /// Global volume (0-64), Gxx
    SetGlobalVolume(u8),

    /// Global volume slide, Hxy
    GlobalVolumeSlide { up: u8, down: u8 },

    /// Tremor, Txy (on for x+1 ticks, off for y+1 ticks)
    Tremor { ontime: u8, offtime: u8 },

    // =========================================================================
    // Pitch Effects
    // =========================================================================
    /// Pitch slide up, 1xx
    PortamentoUp(u8),

    /// Pitch slide down, 2xx
    PortamentoDown(u8),

    /// Fine pitch slide up, E1x
    FinePortaUp(u8),

    /// Fine pitch slide down, E2x
    FinePortaDown(u8),

    /// Extra fine pitch slide up, X1x
    ExtraFinePortaUp(u8),

    /// Extra fine pitch slide down, X2x
    ExtraFinePortaDown(u8),

    /// Tone portamento (slide to note), 3xx
    TonePortamento(u8),

    /// Tone portamento + volume slide, 5xy
    TonePortaVolSlide { vol_up: u8, vol_down: u8 },

    /// Arpeggio, 0xy
    Arpeggio { note1: u8, note2: u8 },

    /// Set finetune, E5x
    SetFinetune(u8),

    /// Round tone portamento to semitones, E3x
    SetGlissando(bool),

    // =========================================================================
    // Modulation Effects
    // =========================================================================
    /// Vibrato, 4xy
    Vibrato { speed: u8, depth: u8 },

    /// Vibrato + volume slide, 6xy
    VibratoVolSlide { vol_up: u8, vol_down: u8 },

    /// Tremolo, 7xy
    Tremolo { speed: u8, depth: u8 },

    /// Set vibrato waveform, E4x
    VibratoWaveform(u8),

    /// Set tremolo waveform, E7x
    TremoloWaveform(u8),

    // =========================================================================
    // Panning Effects
    // =========================================================================
    /// Set panning (0-255), 8xx or E8x
    SetPanning(u8),

    /// Panning slide, Pxy
    PanningSlide { left: u8, right: u8 },

    // =========================================================================
    // Sample Effects
    // =========================================================================
    /// Sample offset in units of 256 frames, 9xx
    SampleOffset(u8),

    /// Retrigger note every x ticks, E9x
    Retrigger(u8),

    /// Multi retrig note with volume change, Rxy
    MultiRetrig { ticks: u8, volume: u8 },

    /// Note cut (cut after N ticks), ECx
    NoteCut(u8),

    /// Note delay (trigger note after N ticks), EDx
    NoteDelay(u8),

    // =========================================================================
    // Instrument Effects
    // =========================================================================
    /// Set envelope position, Lxx
    SetEnvelopePosition(u8),

    /// Key off at tick xx, Kxx
    KeyOff(u8),
}

impl TrackerEffect {
    /// Decode a ProTracker-numbered effect (commands 0x0-0xF)
    ///
    /// Commands above 0xF return `None`; format converters handle those.
    pub fn from_protracker(cmd: u8, param: u8) -> Self {
        let (hi, lo) = (param >> 4, param & 0x0F);
        match cmd {
            0x0 if param == 0 => Self::None,
            0x0 => Self::Arpeggio {
                note1: hi,
                note2: lo,
            },
            0x1 => Self::PortamentoUp(param),
            0x2 => Self::PortamentoDown(param),
            0x3 => Self::TonePortamento(param),
            0x4 => Self::Vibrato {
                speed: hi,
                depth: lo,
            },
            0x5 => Self::TonePortaVolSlide {
                vol_up: hi,
                vol_down: lo,
            },
            0x6 => Self::VibratoVolSlide {
                vol_up: hi,
                vol_down: lo,
            },
            0x7 => Self::Tremolo {
                speed: hi,
                depth: lo,
            },
            0x8 => Self::SetPanning(param),
            0x9 => Self::SampleOffset(param),
            0xA => Self::VolumeSlide { up: hi, down: lo },
            0xB => Self::PositionJump(param),
            0xC => Self::SetVolume(param.min(64)),
            // Row is stored as two decimal digits
            0xD => Self::PatternBreak((hi * 10 + lo).min(255)),
            0xE => Self::from_extended(hi, lo),
            0xF if param == 0 => Self::None,
            0xF if param < 0x20 => Self::SetSpeed(param),
            0xF => Self::SetTempo(param),
            _ => Self::None,
        }
    }

    /// Decode an Exy sub-command
    fn from_extended(sub_cmd: u8, value: u8) -> Self {
        match sub_cmd {
            0x1 => Self::FinePortaUp(value),
            0x2 => Self::FinePortaDown(value),
            0x3 => Self::SetGlissando(value != 0),
            0x4 => Self::VibratoWaveform(value),
            0x5 => Self::SetFinetune(value),
            0x6 => Self::PatternLoop(value),
            0x7 => Self::TremoloWaveform(value),
            0x8 => Self::SetPanning(value * 17),
            0x9 => Self::Retrigger(value),
            0xA => Self::FineVolumeUp(value),
            0xB => Self::FineVolumeDown(value),
            0xC => Self::NoteCut(value),
            0xD => Self::NoteDelay(value),
            0xE => Self::PatternDelay(value),
            // E0x (Amiga filter) and EFx (invert loop) have no effect here
            _ => Self::None,
        }
    }

    /// Check if this effect controls pattern flow
    pub fn affects_pattern_flow(&self) -> bool {
        matches!(
            self,
            Self::PositionJump(_)
                | Self::PatternBreak(_)
                | Self::PatternDelay(_)
                | Self::PatternLoop(_)
        )
    }

    /// Check if this effect changes speed or tempo
    pub fn affects_timing(&self) -> bool {
        matches!(self, Self::SetSpeed(_) | Self::SetTempo(_))
    }

    /// Check if this effect modifies global volume
    pub fn affects_global_volume(&self) -> bool {
        matches!(
            self,
            Self::SetGlobalVolume(_) | Self::GlobalVolumeSlide { .. }
        )
    }
}

/// Decoded XM volume column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeEffect {
    /// Empty column
    #[default]
    None,
    /// Set volume (0-64)
    SetVolume(u8),
    /// Volume slide down per tick
    SlideDown(u8),
    /// Volume slide up per tick
    SlideUp(u8),
    /// Fine volume slide down (tick 0 only)
    FineDown(u8),
    /// Fine volume slide up (tick 0 only)
    FineUp(u8),
    /// Set vibrato speed
    VibratoSpeed(u8),
    /// Vibrato with this depth
    VibratoDepth(u8),
    /// Set panning (0-255)
    SetPanning(u8),
    /// Panning slide left per tick
    PanSlideLeft(u8),
    /// Panning slide right per tick
    PanSlideRight(u8),
    /// Tone portamento with speed x*16
    TonePortamento(u8),
}
