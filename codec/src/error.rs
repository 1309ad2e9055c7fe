//! Error types for codec operations

use thiserror::Error;

/// Error type for codec operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The destination buffer is too small, or the input ended (or a length prefix points)
    /// past the available bytes.
    #[error("no buffer space")]
    NoBufferSpace,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The fingerprint (or type literal) embedded in the header does not match the target type.
    #[error("hash conflict: expected {expected:#010x}, found {found:#010x}")]
    HashConflict { expected: u32, found: u32 },
    /// A length prefix cannot be represented by this platform's `usize`.
    #[error("length prefix too wide for this platform: {0}")]
    TooWidthSize(u64),
}

impl Error {
    /// Returns the kind of this error.
    pub fn code(&self) -> Errc {
        match self {
            Self::NoBufferSpace => Errc::NoBufferSpace,
            Self::InvalidArgument(_) => Errc::InvalidArgument,
            Self::HashConflict { .. } => Errc::HashConflict,
            Self::TooWidthSize(_) => Errc::TooWidthSize,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Closed set of error kinds reported by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Errc {
    Ok,
    NoBufferSpace,
    InvalidArgument,
    HashConflict,
    TooWidthSize,
}

impl Errc {
    /// Returns a static description of the error kind.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NoBufferSpace => "no buffer space",
            Self::InvalidArgument => "invalid argument",
            Self::HashConflict => "hash conflict",
            Self::TooWidthSize => "too width size",
        }
    }
}

/// Returns the message associated with an error kind.
pub fn error_message(code: Errc) -> &'static str {
    code.message()
}

impl<T> From<&Result<T, Error>> for Errc {
    fn from(result: &Result<T, Error>) -> Self {
        match result {
            Ok(_) => Errc::Ok,
            Err(err) => err.code(),
        }
    }
}
