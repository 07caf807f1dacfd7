//! XM parsing error types

use core::fmt;

/// XM parsing error types
#[derive(Debug, Clone, PartialEq)]
pub enum XmError {
    /// File too small to contain header
    TooSmall,
    /// Invalid magic string (not "Extended Module: ")
    InvalidMagic,
    /// Unsupported XM version
    UnsupportedVersion(u16),
    /// Invalid header size
    InvalidHeaderSize,
    /// Too many channels (> 32) or zero channels
    TooManyChannels(u8),
    /// Pattern count exceeds maximum
    TooManyPatterns(u16),
    /// Instrument count exceeds maximum
    TooManyInstruments(u16),
    /// Invalid pattern data
    InvalidPattern(u16),
    /// Instrument parsing error
    InvalidInstrument(u16),
    /// Sample header or data error (instrument index, sample index)
    InvalidSample(u16, u8),
    /// A buffer reservation was refused (requested bytes)
    OutOfMemory(usize),
    /// Unexpected end of file
    UnexpectedEof,
    /// IO error during parsing
    IoError(String),
}

impl XmError {
    /// True when the input looked like an XM file but its structure is broken
    pub fn is_corrupt(&self) -> bool {
        !matches!(
            self,
            XmError::InvalidMagic | XmError::UnsupportedVersion(_) | XmError::OutOfMemory(_)
        )
    }
}

impl fmt::Display for XmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmError::TooSmall => write!(f, "File too small to contain XM header"),
            XmError::InvalidMagic => write!(f, "Invalid XM magic string"),
            XmError::UnsupportedVersion(v) => write!(f, "Unsupported XM version: 0x{:04X}", v),
            XmError::InvalidHeaderSize => write!(f, "Invalid XM header size"),
            XmError::TooManyChannels(n) => {
                write!(f, "Invalid channel count: {} (max {})", n, crate::MAX_CHANNELS)
            }
            XmError::TooManyPatterns(n) => {
                write!(f, "Too many patterns: {} (max {})", n, crate::MAX_PATTERNS)
            }
            XmError::TooManyInstruments(n) => {
                write!(
                    f,
                    "Too many instruments: {} (max {})",
                    n,
                    crate::MAX_INSTRUMENTS
                )
            }
            XmError::InvalidPattern(n) => write!(f, "Invalid pattern data at index {}", n),
            XmError::InvalidInstrument(n) => write!(f, "Invalid instrument at index {}", n),
            XmError::InvalidSample(i, s) => {
                write!(f, "Invalid sample {} of instrument {}", s, i)
            }
            XmError::OutOfMemory(n) => write!(f, "Failed to reserve {} bytes", n),
            XmError::UnexpectedEof => write!(f, "Unexpected end of file"),
            XmError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for XmError {}

impl From<std::io::Error> for XmError {
    fn from(e: std::io::Error) -> Self {
        XmError::IoError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            XmError::TooSmall.to_string(),
            "File too small to contain XM header"
        );
        assert_eq!(XmError::InvalidMagic.to_string(), "Invalid XM magic string");
        assert_eq!(
            XmError::UnsupportedVersion(0x0103).to_string(),
            "Unsupported XM version: 0x0103"
        );
        assert_eq!(
            XmError::TooManyChannels(64).to_string(),
            "Invalid channel count: 64 (max 32)"
        );
        assert_eq!(
            XmError::InvalidSample(2, 1).to_string(),
            "Invalid sample 1 of instrument 2"
        );
    }

    #[test]
    fn test_corrupt_classification() {
        assert!(XmError::UnexpectedEof.is_corrupt());
        assert!(XmError::InvalidPattern(3).is_corrupt());
        assert!(!XmError::InvalidMagic.is_corrupt());
        assert!(!XmError::OutOfMemory(1 << 20).is_corrupt());
    }
}
