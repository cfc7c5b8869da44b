//! Catalog-level rate-limit backoff.
//!
//! When the remote side signals that we are going too fast, the orchestrator
//! sleeps for an escalating, capped duration and retries the same item. Any
//! success resets the escalation. This is distinct from `retry`, which handles
//! short-lived transport faults inside a single transfer.

mod controller;
mod signals;

pub use controller::{BackoffController, BackoffState};
pub use signals::{FailureClass, RateLimitSignals};
