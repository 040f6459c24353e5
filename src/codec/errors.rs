//! Codec error types
//!
//! Low-level failures while pulling primitive values out of the state
//! stream. The restore layer converts these into its structured fatal
//! errors; nothing at this level is recoverable.

use std::io;
use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced by the state stream codecs
#[derive(Debug, Error)]
pub enum CodecError {
    /// The stream ended before a complete value was available.
    #[error("end of model state file found unexpectedly")]
    Truncated,

    /// A text token could not be parsed as the expected primitive.
    #[error("malformed token {token:?}: expected {expected}")]
    Malformed {
        token: String,
        expected: &'static str,
    },

    /// A record header carried a count no writer would produce.
    #[error("invalid record header field {field} = {value}")]
    InvalidHeader { field: &'static str, value: i64 },

    /// Underlying I/O failure.
    #[error("I/O error reading model state file: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    pub(crate) fn malformed(token: impl Into<String>, expected: &'static str) -> Self {
        CodecError::Malformed {
            token: token.into(),
            expected,
        }
    }

    pub(crate) fn invalid_header(field: &'static str, value: i64) -> Self {
        CodecError::InvalidHeader { field, value }
    }
}
