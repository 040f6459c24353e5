//! Restore error types
//!
//! A state file is a trusted, previously validated artifact: anything wrong
//! with it is a configuration or environment problem, not a transient fault.
//! Every restore error is therefore FATAL, carries a structured code, and is
//! surfaced with an operator-facing message; no retries exist anywhere in
//! the restore path.

use std::fmt;
use std::io;

use crate::codec::CodecError;

/// Error severity. Restore errors are always fatal; non-fatal repairs are
/// reported as warnings, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Unrecoverable; the restore aborts and the run cannot start.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Structured restore error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateErrorCode {
    /// The requested cell does not appear in the state file.
    StateCellNotFound,
    /// Record tile count disagrees with the vegetation configuration.
    StateTileCountMismatch,
    /// Record band count disagrees with the snow band configuration.
    StateBandCountMismatch,
    /// Record lake flag disagrees with the configured lake coverage.
    StateLakeFlagMismatch,
    /// A tile/band identity pair did not match its decode position.
    StateOrderMismatch,
    /// Stored lake node count disagrees with the lake configuration.
    StateLakeNodeMismatch,
    /// The stream ended inside a record.
    StateTruncated,
    /// A stored value could not be parsed.
    StateMalformed,
    /// Caller configuration and aggregate disagree in shape.
    StateInvalidConfig,
    /// Underlying I/O failure.
    StateIo,
}

impl StateErrorCode {
    /// Returns the string form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            StateErrorCode::StateCellNotFound => "STATE_CELL_NOT_FOUND",
            StateErrorCode::StateTileCountMismatch => "STATE_TILE_COUNT_MISMATCH",
            StateErrorCode::StateBandCountMismatch => "STATE_BAND_COUNT_MISMATCH",
            StateErrorCode::StateLakeFlagMismatch => "STATE_LAKE_FLAG_MISMATCH",
            StateErrorCode::StateOrderMismatch => "STATE_ORDER_MISMATCH",
            StateErrorCode::StateLakeNodeMismatch => "STATE_LAKE_NODE_MISMATCH",
            StateErrorCode::StateTruncated => "STATE_TRUNCATED",
            StateErrorCode::StateMalformed => "STATE_MALFORMED",
            StateErrorCode::StateInvalidConfig => "STATE_INVALID_CONFIG",
            StateErrorCode::StateIo => "STATE_IO",
        }
    }

    /// Severity of the code. All restore errors abort the restore.
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for StateErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Restore error with full context.
#[derive(Debug)]
pub struct StateError {
    code: StateErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl StateError {
    fn new(code: StateErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// The requested cell never appeared before end of stream.
    pub fn cell_not_found(cell_id: i32) -> Self {
        Self::new(
            StateErrorCode::StateCellNotFound,
            format!("Requested grid cell ({cell_id}) is not in the model state file."),
        )
    }

    /// Record tile count differs from the configured tile count.
    pub fn tile_count_mismatch(cell_id: i32, stored: usize, configured: usize) -> Self {
        Self::new(
            StateErrorCode::StateTileCountMismatch,
            format!(
                "The number of vegetation tiles in cell {cell_id} ({stored}) does not equal \
                 that defined in the vegetation parameter file ({configured}). Check your \
                 input files."
            ),
        )
    }

    /// Record band count differs from the configured band count.
    pub fn band_count_mismatch(cell_id: i32, stored: usize, configured: usize) -> Self {
        Self::new(
            StateErrorCode::StateBandCountMismatch,
            format!(
                "The number of snow bands in cell {cell_id} ({stored}) does not equal that \
                 defined in the snow band file ({configured}). Check your input files."
            ),
        )
    }

    /// Lake coverage configured but the record lists no lake.
    pub fn lake_not_listed(cell_id: i32) -> Self {
        Self::new(
            StateErrorCode::StateLakeFlagMismatch,
            format!(
                "The model state file does not list a lake for cell {cell_id}, but the lake \
                 coverage given by the lake parameter file is > 0. Check your input files."
            ),
        )
    }

    /// Record lists a lake but no lake coverage is configured.
    pub fn lake_unexpected(cell_id: i32) -> Self {
        Self::new(
            StateErrorCode::StateLakeFlagMismatch,
            format!(
                "The model state file lists a lake for cell {cell_id}, but the lake coverage \
                 given by the lake parameter file is 0. Check your input files."
            ),
        )
    }

    /// A tile/band identity pair in the stream disagreed with the decode
    /// position.
    pub fn order_mismatch(
        stored_tile: i32,
        stored_band: i32,
        expected_tile: usize,
        expected_band: usize,
    ) -> Self {
        Self::new(
            StateErrorCode::StateOrderMismatch,
            format!(
                "The tile and band indices in the model state file (tile = {stored_tile}, \
                 band = {stored_band}) do not match those currently requested (tile = \
                 {expected_tile}, band = {expected_band}). The state file must store every \
                 tile indexed by every band."
            ),
        )
    }

    /// Stored lake node count disagrees with the lake parameter file.
    pub fn lake_node_mismatch(stored: i64, configured: usize) -> Self {
        Self::new(
            StateErrorCode::StateLakeNodeMismatch,
            format!(
                "The number of lake nodes stored in the state file ({stored}) does not match \
                 the number of lake nodes in the lake parameter file ({configured})."
            ),
        )
    }

    /// Stored active lake node count exceeds the configured lake nodes.
    pub fn lake_active_overflow(stored: i64, configured: usize) -> Self {
        Self::new(
            StateErrorCode::StateLakeNodeMismatch,
            format!(
                "The active lake node count stored in the state file ({stored}) exceeds the \
                 number of lake nodes in the lake parameter file ({configured})."
            ),
        )
    }

    /// The stream ended inside a record.
    pub fn truncated() -> Self {
        Self::new(
            StateErrorCode::StateTruncated,
            "End of model state file found unexpectedly.",
        )
    }

    /// A stored value could not be parsed.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(StateErrorCode::StateMalformed, message)
    }

    /// Configuration and caller-allocated aggregate disagree in shape.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(StateErrorCode::StateInvalidConfig, message)
    }

    /// Underlying I/O failure while reading the stream.
    pub fn io(source: io::Error) -> Self {
        Self {
            code: StateErrorCode::StateIo,
            message: "I/O error reading model state file".to_string(),
            source: Some(source),
        }
    }

    /// Returns the error code.
    pub fn code(&self) -> StateErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the severity. Restore errors are always fatal.
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Whether this error aborts the restore. Always true.
    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {source})")?;
        }
        Ok(())
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<CodecError> for StateError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Truncated => StateError::truncated(),
            CodecError::Malformed { .. } | CodecError::InvalidHeader { .. } => {
                StateError::malformed(err.to_string())
            }
            CodecError::Io(source) => StateError::io(source),
        }
    }
}

/// Result type for restore operations.
pub type StateResult<T> = Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            StateErrorCode::StateCellNotFound.as_str(),
            "STATE_CELL_NOT_FOUND"
        );
        assert_eq!(
            StateErrorCode::StateOrderMismatch.as_str(),
            "STATE_ORDER_MISMATCH"
        );
        assert_eq!(StateErrorCode::StateTruncated.as_str(), "STATE_TRUNCATED");
    }

    #[test]
    fn test_all_errors_fatal() {
        let err = StateError::cell_not_found(9);
        assert!(err.is_fatal());
        assert_eq!(err.severity(), Severity::Fatal);
    }

    #[test]
    fn test_cell_not_found_names_cell() {
        let err = StateError::cell_not_found(9);
        assert!(err.message().contains("(9)"));
        assert!(format!("{err}").contains("STATE_CELL_NOT_FOUND"));
    }

    #[test]
    fn test_band_mismatch_names_both_counts() {
        let err = StateError::band_count_mismatch(5, 3, 2);
        assert!(err.message().contains("(3)"));
        assert!(err.message().contains("(2)"));
    }

    #[test]
    fn test_codec_truncation_converts() {
        let err: StateError = CodecError::Truncated.into();
        assert_eq!(err.code(), StateErrorCode::StateTruncated);
        assert!(err.message().contains("unexpectedly"));
    }

    #[test]
    fn test_codec_io_preserves_source() {
        let io_err = io::Error::new(io::ErrorKind::Other, "device lost");
        let err: StateError = CodecError::Io(io_err).into();
        assert_eq!(err.code(), StateErrorCode::StateIo);
        assert!(format!("{err}").contains("device lost"));
    }
}
