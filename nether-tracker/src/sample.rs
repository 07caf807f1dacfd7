//! Sample data structures

/// Unified tracker sample with decoded PCM
#[derive(Debug, Clone, Default)]
pub struct TrackerSample {
    /// Sample name
    pub name: String,
    /// Signed 16-bit mono PCM
    pub data: Vec<i16>,
    /// Default volume (0-64)
    pub default_volume: u8,
    /// Default panning (0-255), None to keep the channel's panning
    pub default_pan: Option<u8>,
    /// Finetune in 1/128 semitones (-128..=127)
    pub finetune: i8,
    /// Semitone offset applied to every note
    pub relative_note: i8,
    /// Loop start in frames
    pub loop_start: u32,
    /// Loop end in frames (exclusive)
    pub loop_end: u32,
    /// Loop type
    pub loop_type: LoopType,
}

impl TrackerSample {
    /// Number of frames
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when a loop is set and covers at least one frame
    pub fn has_loop(&self) -> bool {
        self.loop_type != LoopType::None && self.loop_end > self.loop_start
    }
}

/// Sample loop type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopType {
    /// No loop
    #[default]
    None,
    /// Forward loop
    Forward,
    /// Ping-pong (bidirectional) loop
    PingPong,
}
