use polars::prelude::PolarsError;
use std::io;
use thiserror::Error;
use tokio::task::JoinError;

/**
Result type to simplify function signatures.

Functions can return `UploaderResult<T>` and then use `?` to automatically propagate errors.
*/
pub type UploaderResult<T> = Result<T, UploaderError>;

/**
Custom error type for the CSV uploader.

This enum covers the errors that escape an operation and reach its caller.
Upload failures are *not* reported through this type: `upload` always returns
an `UploadOutcome`, whose `Failed` variant carries an `UploadError`.
*/
#[derive(Error, Debug)]
pub enum UploaderError {
    // Wrapper for standard IO errors (reading the chosen file, opening the database file).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Wrapper for Polars errors (CSV parsing, DataFrame access).
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    // Wrapper for DuckDB errors raised outside the catalog queries.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    // The metadata catalog could not be queried (e.g. the database went away).
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    // Wrapper for Tokio JoinErrors, occurring when blocking tasks fail.
    #[error("Tokio JoinError: {0}")]
    TokioJoin(#[from] JoinError),

    // Errors occurring when receiving data from asynchronous channels.
    #[error("Channel receive error: {0}")]
    ChannelReceive(String),

    // Indicates an invalid CSV delimiter was provided (empty or multi-byte).
    #[error("Invalid CSV delimiter: '{0}'")]
    InvalidDelimiter(String),

    #[error("Invalid value for command-line argument '{arg_name}': {reason}")]
    InvalidArgument { arg_name: String, reason: String },

    // A catch-all for other, less specific errors.
    #[error("Other error: {0}")]
    Other(String),
}

impl From<String> for UploaderError {
    fn from(err: String) -> UploaderError {
        UploaderError::Other(err)
    }
}

impl UploaderError {
    /// `true` when the same request may succeed if simply repeated
    /// (the catalog or the database was momentarily unreachable).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UploaderError::CatalogUnavailable(_) | UploaderError::DuckDb(_)
        )
    }
}

/// Why an upload failed.
///
/// Each variant names the pipeline step that failed and carries the text of
/// the underlying error, so callers can react differently (retry a lost
/// connection, never retry a malformed file).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The file could not be parsed as CSV.
    #[error("{0}")]
    Parse(String),

    /// Selecting the destination schema on the session failed.
    #[error("{0}")]
    ContextSwitch(String),

    /// Appending the rows failed (unknown table, column mismatch, type error...).
    #[error("{0}")]
    Write(String),

    /// No session could be acquired on the database.
    #[error("{0}")]
    Connectivity(String),

    /// The upload task itself broke down (panicked or vanished) before reporting.
    #[error("{0}")]
    Internal(String),
}

impl UploadError {
    /// Only a lost connection is worth retrying as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UploadError::Connectivity(_))
    }

    /// Short name of the failed step, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Parse(_) => "parse",
            UploadError::ContextSwitch(_) => "context switch",
            UploadError::Write(_) => "write",
            UploadError::Connectivity(_) => "connectivity",
            UploadError::Internal(_) => "internal",
        }
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

#[cfg(test)]
mod tests_upload_error {
    use super::*;

    #[test]
    fn only_connectivity_is_retryable() {
        assert!(UploadError::Connectivity("gone".into()).is_retryable());
        assert!(!UploadError::Parse("bad".into()).is_retryable());
        assert!(!UploadError::ContextSwitch("bad".into()).is_retryable());
        assert!(!UploadError::Write("bad".into()).is_retryable());
        assert!(!UploadError::Internal("panicked".into()).is_retryable());
    }

    #[test]
    fn catalog_failures_are_retryable() {
        assert!(UploaderError::CatalogUnavailable("locked".into()).is_retryable());
        assert!(!UploaderError::InvalidDelimiter(";;".into()).is_retryable());
        assert!(!UploaderError::ChannelReceive("closed".into()).is_retryable());
    }

    #[test]
    fn display_is_the_raw_error_text() {
        let error = UploadError::Write("Binder Error: column not found".into());
        assert_eq!(error.to_string(), "Binder Error: column not found");
        assert_eq!(error.kind(), "write");
    }
}
