//! Retry loop: run an async operation until success or policy says stop.

use std::future::Future;

use super::classify;
use super::error::TransferError;
use super::policy::{RetryDecision, RetryPolicy};

/// Final result of a retried operation plus the attempts it consumed.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, TransferError>,
    pub attempts: u32,
}

/// Runs `f` until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut f: F) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, TransferError>>,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt).await {
            Ok(v) => {
                return RetryOutcome {
                    result: Ok(v),
                    attempts: attempt,
                }
            }
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => {
                        return RetryOutcome {
                            result: Err(e),
                            attempts: attempt,
                        }
                    }
                    RetryDecision::RetryAfter(d) => {
                        tracing::debug!(attempt, ?kind, delay_ms = d.as_millis() as u64, "transfer failed, retrying: {}", e);
                        tokio::time::sleep(d).await;
                        attempt += 1;
                    }
                }
            }
        }
    }
}
