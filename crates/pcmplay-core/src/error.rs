//! Error types for pcmplay.

use thiserror::Error;

/// Result type alias using pcmplay's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pcmplay.
#[derive(Error, Debug)]
pub enum Error {
    // Playback path errors
    #[error("Invalid base64 payload: {0}")]
    Decode(String),

    #[error("Malformed PCM stream: {len} bytes is not a multiple of the {alignment}-byte frame size")]
    MalformedStream { len: usize, alignment: usize },

    #[error("Invalid input from host: {0}")]
    InvalidInput(String),

    #[error("Audio sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("Payload contains no audio frames")]
    EmptyStream,

    // Tooling errors
    #[error("WAV encoding failed: {0}")]
    Wav(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error categories reported to the host as negative status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    MalformedStream,
    InvalidInput,
    SinkUnavailable,
    EmptyStream,
    Other,
}

impl ErrorKind {
    /// Numeric code sent to the host. Always negative.
    pub const fn code(self) -> i32 {
        match self {
            Self::Decode => -1,
            Self::MalformedStream => -2,
            Self::InvalidInput => -3,
            Self::SinkUnavailable => -4,
            Self::EmptyStream => -5,
            Self::Other => -99,
        }
    }

    /// Map a host-facing code back to its kind.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Decode),
            -2 => Some(Self::MalformedStream),
            -3 => Some(Self::InvalidInput),
            -4 => Some(Self::SinkUnavailable),
            -5 => Some(Self::EmptyStream),
            -99 => Some(Self::Other),
            _ => None,
        }
    }
}

impl Error {
    /// The category this error is reported under.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::MalformedStream { .. } => ErrorKind::MalformedStream,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::SinkUnavailable(_) => ErrorKind::SinkUnavailable,
            Self::EmptyStream => ErrorKind::EmptyStream,
            Self::Wav(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Internal(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_negative() {
        for kind in [
            ErrorKind::Decode,
            ErrorKind::MalformedStream,
            ErrorKind::InvalidInput,
            ErrorKind::SinkUnavailable,
            ErrorKind::EmptyStream,
            ErrorKind::Other,
        ] {
            assert!(kind.code() < 0);
            assert_eq!(ErrorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code(0), None);
    }

    #[test]
    fn test_error_kind() {
        let err = Error::MalformedStream {
            len: 1,
            alignment: 2,
        };
        assert_eq!(err.kind(), ErrorKind::MalformedStream);
        assert_eq!(Error::EmptyStream.kind().code(), -5);
    }

    #[test]
    fn test_error_display() {
        let err = Error::MalformedStream {
            len: 3,
            alignment: 2,
        };
        assert_eq!(
            err.to_string(),
            "Malformed PCM stream: 3 bytes is not a multiple of the 2-byte frame size"
        );
    }
}
