//! Engine error types

use nether_mod::ModError;
use nether_xm::XmError;

/// Result type used throughout the engine
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors reported by loading, querying and controlling modules
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The bytes do not match any supported module format
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The format was recognized but its structure is invalid
    #[error("corrupt module data: {0}")]
    CorruptData(String),

    /// A buffer reservation was refused while loading
    #[error("allocation failed: {0}")]
    AllocationFailure(String),

    /// An index-validated lookup was out of range
    #[error("invalid {what} index {index}")]
    InvalidIndex { what: &'static str, index: i64 },

    /// The module is read-only; every mutation fails with this
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Unknown control key or a value that does not parse
    #[error("invalid value {value:?} for control {key:?}")]
    InvalidControl { key: String, value: String },

    /// A render configuration file could not be read or parsed
    #[error("invalid render config: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invalid_index(what: &'static str, index: impl Into<i64>) -> Self {
        Self::InvalidIndex {
            what,
            index: index.into(),
        }
    }

    pub(crate) fn invalid_control(key: &str, value: &str) -> Self {
        Self::InvalidControl {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Host-facing error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedFormat(_) => ErrorCode::UnsupportedFormat,
            Self::CorruptData(_) => ErrorCode::CorruptData,
            Self::AllocationFailure(_) => ErrorCode::AllocationFailure,
            Self::InvalidIndex { .. } => ErrorCode::InvalidIndex,
            Self::UnsupportedOperation(_) => ErrorCode::UnsupportedOperation,
            Self::InvalidControl { .. } | Self::Config(_) => ErrorCode::InvalidArgument,
        }
    }
}

/// Stable numeric error codes for hosts that cannot carry Rust errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    UnsupportedFormat = 1,
    CorruptData = 2,
    AllocationFailure = 3,
    InvalidIndex = 4,
    UnsupportedOperation = 5,
    InvalidArgument = 6,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported_format",
            Self::CorruptData => "corrupt_data",
            Self::AllocationFailure => "allocation_failure",
            Self::InvalidIndex => "invalid_index",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::InvalidArgument => "invalid_argument",
        }
    }
}

impl From<XmError> for Error {
    fn from(err: XmError) -> Self {
        match err {
            XmError::OutOfMemory(_) => Self::AllocationFailure(err.to_string()),
            _ if err.is_corrupt() => Self::CorruptData(err.to_string()),
            _ => Self::UnsupportedFormat(err.to_string()),
        }
    }
}

impl From<ModError> for Error {
    fn from(err: ModError) -> Self {
        match err {
            ModError::OutOfMemory(_) => Self::AllocationFailure(err.to_string()),
            _ if err.is_corrupt() => Self::CorruptData(err.to_string()),
            _ => Self::UnsupportedFormat(err.to_string()),
        }
    }
}
