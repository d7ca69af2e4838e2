//! Error types, split the way the teacher splits `indexer::Error` /
//! `NonCriticalIndexerError`: hard errors that abort a job, and non-critical
//! errors that are logged and skipped (spec.md §7).

use thiserror::Error;

/// Hard, job-aborting errors (spec.md §7 "Hard errors").
#[derive(Error, Debug)]
pub enum Error {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("job was cancelled")]
    Cancelled,

    #[error("missing required invariant: {0}")]
    MissingInvariant(String),

    #[error("duplicate key for {entity}: {key}")]
    DuplicateKey { entity: &'static str, key: String },

    #[error("scan state map contains invalid id 0 for key: {0}")]
    ZeroId(String),
}

/// Errors surfaced from a [`crate::store::MediaStore`] implementation.
///
/// The core treats all of these as hard errors except where the call site
/// explicitly tolerates a duplicate (MediaTag only, per spec.md §4.4 step 5).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("transaction error: {0}")]
    Transaction(String),
    #[error("duplicate natural key: {0}")]
    Duplicate(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors logged and skipped rather than failing the whole job (spec.md §7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NonCriticalError {
    #[error("scanner failed for launcher on system '{system_id}': {reason}")]
    ScannerFailed { system_id: String, reason: String },

    #[error("malformed percent-encoding in path, storing raw: {0}")]
    MalformedPercentEncoding(String),

    #[error("unknown filename tag skipped: {0}")]
    UnknownTagSkipped(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
