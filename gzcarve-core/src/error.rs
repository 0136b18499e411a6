//! Error types for gzcarve operations.
//!
//! Every variant is terminal for the current run: the first failure is
//! propagated to the caller and nothing is retried. Candidates rejected by the
//! header heuristics are ordinary scanner control flow and never appear here.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which part of a gzip member the decompression engine rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Member header framing (magic, method, flags, header CRC).
    Header,
    /// The DEFLATE stream itself.
    Data,
    /// Trailer CRC-32 or length does not match the decoded payload.
    Checksum,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::Data => "data",
            Self::Checksum => "checksum",
        };
        f.write_str(name)
    }
}

/// The main error type for gzcarve operations.
#[derive(Debug, Error)]
pub enum CarveError {
    /// The input source failed while refilling the window.
    #[error("read error: {0}")]
    Read(#[source] io::Error),

    /// The output sink failed, including failures while opening or closing it.
    #[error("write error: {0}")]
    Write(#[source] io::Error),

    /// The decompression engine rejected the member.
    #[error("{kind} error during inflation: {detail}")]
    Decode {
        /// Engine-specific failure class.
        kind: DecodeErrorKind,
        /// Human-readable detail from the engine.
        detail: String,
    },

    /// Input ended inside a member header or payload.
    #[error("input ran out inside gzip data at offset {offset:#x}")]
    TruncatedStream {
        /// Stream offset at which input ran out.
        offset: u64,
    },

    /// No gzip member was located anywhere in the input.
    #[error("no gzip data found")]
    NoDataFound,

    /// The requested member ordinal is larger than the number of members found.
    #[error("less than {requested} sections of gzip data (found {found})")]
    OrdinalOutOfRange {
        /// Requested 1-based ordinal.
        requested: usize,
        /// Number of members actually found.
        found: usize,
    },

    /// A generated output name collides with an existing file.
    #[error("generated filename '{}' already exists, not replacing", path.display())]
    OutputExists {
        /// The path that already exists.
        path: PathBuf,
    },

    /// Options that cannot drive a session.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the rejected option.
        message: String,
    },
}

/// Result type alias for gzcarve operations.
pub type Result<T> = std::result::Result<T, CarveError>;

impl CarveError {
    /// Create a read error.
    pub fn read(err: io::Error) -> Self {
        Self::Read(err)
    }

    /// Create a write error.
    pub fn write(err: io::Error) -> Self {
        Self::Write(err)
    }

    /// Create a decode error.
    pub fn decode(kind: DecodeErrorKind, detail: impl Into<String>) -> Self {
        Self::Decode {
            kind,
            detail: detail.into(),
        }
    }

    /// Create a truncated stream error.
    pub fn truncated(offset: u64) -> Self {
        Self::TruncatedStream { offset }
    }

    /// Create an ordinal out of range error.
    pub fn ordinal_out_of_range(requested: usize, found: usize) -> Self {
        Self::OrdinalOutOfRange { requested, found }
    }

    /// Create an output exists error.
    pub fn output_exists(path: impl Into<PathBuf>) -> Self {
        Self::OutputExists { path: path.into() }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// The decode failure class, if this is a decode error.
    pub fn decode_kind(&self) -> Option<DecodeErrorKind> {
        match self {
            Self::Decode { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = CarveError::ordinal_out_of_range(5, 2);
        assert_eq!(
            err.to_string(),
            "less than 5 sections of gzip data (found 2)"
        );

        let err = CarveError::output_exists("data.txt");
        assert!(err.to_string().contains("'data.txt' already exists"));

        let err = CarveError::decode(DecodeErrorKind::Checksum, "incorrect data check");
        assert_eq!(
            err.to_string(),
            "checksum error during inflation: incorrect data check"
        );

        let err = CarveError::truncated(0x1234);
        assert!(err.to_string().contains("0x1234"));
    }

    #[test]
    fn test_io_errors_keep_source() {
        let err = CarveError::read(io::Error::other("disk gone"));
        assert!(matches!(err, CarveError::Read(_)));
        assert!(err.source().is_some());

        let err = CarveError::write(io::Error::new(io::ErrorKind::WriteZero, "short"));
        assert!(err.to_string().starts_with("write error"));
    }

    #[test]
    fn test_decode_kind() {
        let err = CarveError::decode(DecodeErrorKind::Header, "header crc mismatch");
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::Header));
        assert_eq!(CarveError::NoDataFound.decode_kind(), None);
    }
}
