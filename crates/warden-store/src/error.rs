//! Persistence errors.

use thiserror::Error;

/// Errors raised by the durable store.
///
/// Read-side failures are deliberately absent: loads never fail, they
/// degrade to the caller's default and log a warning.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing or renaming the store file failed.
    #[error("failed to persist {path}: {source}")]
    Persist {
        /// The destination path.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Encoding the collection to JSON failed.
    #[error("failed to encode store payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// A replace-on-write targeted a request id not present in the
    /// collection. Indicates the record was pruned or the id is stale.
    #[error("request {0} not present in the request collection")]
    RecordMissing(String),
}
