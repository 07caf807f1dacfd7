//! MOD parsing error types

/// Errors produced while parsing a MOD file
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModError {
    /// Shorter than the fixed 1084-byte header
    #[error("file too small to contain a MOD header ({0} bytes)")]
    TooSmall(usize),

    /// Format tag at offset 1080 is not a known MOD signature
    #[error("unknown MOD tag {}", String::from_utf8_lossy(.0))]
    UnknownTag([u8; 4]),

    /// Song length of zero or above 128
    #[error("invalid song length {0}")]
    InvalidSongLength(u8),

    /// Pattern data runs past the end of the file
    #[error("pattern data truncated: need {needed} bytes, have {available}")]
    TruncatedPatterns { needed: usize, available: usize },

    /// A buffer reservation was refused
    #[error("failed to reserve {0} bytes")]
    OutOfMemory(usize),
}

impl ModError {
    /// True when the input carried a MOD tag but its structure is broken
    pub fn is_corrupt(&self) -> bool {
        !matches!(self, ModError::UnknownTag(_) | ModError::OutOfMemory(_))
    }
}
