//! Local retry and backoff policy for resource transfers.
//!
//! This module classifies transfer failures (timeouts, throttling, connection
//! failures) and computes short exponential backoff delays. It is separate
//! from the catalog-level rate-limit controller in `backoff`.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::TransferError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, RetryOutcome};
