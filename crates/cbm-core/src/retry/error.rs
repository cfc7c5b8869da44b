//! Transfer error type for retry classification.

use thiserror::Error;

/// Error returned by a single resource transfer (curl failure, HTTP error, or storage failure).
/// Used so we can classify and decide retries before converting to anyhow.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Transfer completed but fewer bytes arrived than announced
    /// (e.g. server closed early). Enables retry instead of silent truncation.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Disk/storage write failed (e.g. disk full, permission denied). Not retried.
    #[error("storage: {0}")]
    Storage(#[source] std::io::Error),
}
