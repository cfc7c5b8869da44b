//! Run-level errors: the only failures that stop a backup run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The progress ledger could not be read or written.
    #[error("ledger: {0:#}")]
    Ledger(anyhow::Error),
    /// Checksum record, manifest or error log could not be written.
    #[error("run output: {0:#}")]
    Output(anyhow::Error),
    /// Strict mode stopped on the first failed item; it is not marked done.
    #[error("strict mode: item {item_id} failed: {reason}")]
    StrictHalt { item_id: String, reason: String },
    /// Catalog discovery failed with a non-rate-limit error.
    #[error("discovery: {0:#}")]
    Discovery(anyhow::Error),
}
