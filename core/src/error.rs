use thiserror::Error;

use crate::models::{FieldRecordId, ProjectId};

/// Error type for metraj generation and regeneration.
///
/// `ParseError` and `CountMismatch` only ever reach callers of the low-level
/// UD helpers; the planner recovers them into warnings and keeps the grid.
#[derive(Error, Debug, Clone, PartialEq, uniffi::Error)]
#[uniffi(flat_error)]
pub enum MetrajError {
    #[error("invalid target depth: {value}")]
    InvalidDepth { value: String },

    #[error("could not read UD depths from '{input}': {message}")]
    ParseError { input: String, message: String },

    #[error("UD depth count ({parsed}) does not match declared UD count ({declared})")]
    CountMismatch { parsed: u32, declared: u32 },

    #[error("record store failure: {0}")]
    StoreFailure(String),

    #[error("invalid metraj settings: {0}")]
    InvalidSettings(String),
}

impl MetrajError {
    pub(crate) fn invalid_depth(value: impl ToString) -> Self {
        MetrajError::InvalidDepth {
            value: value.to_string(),
        }
    }
}

/// Error type for the project record store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("field record not found: {0}")]
    RecordNotFound(FieldRecordId),

    #[error("field record has no id")]
    MissingRecordId,

    #[error("write rejected: {0}")]
    WriteRejected(String),
}

impl From<StorageError> for MetrajError {
    fn from(err: StorageError) -> Self {
        MetrajError::StoreFailure(err.to_string())
    }
}
