use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::DownloadResult;
use crate::catalog::ResourceLocation;
use crate::checksum::IntegrityVerifier;
use crate::retry::{classify, run_with_retry, ErrorKind, RetryPolicy, TransferError};
use crate::transport::Transport;

pub(super) struct Job {
    pub index: usize,
    pub location: ResourceLocation,
    pub destination: PathBuf,
}

/// Pop jobs until the queue is empty; one transfer in flight per worker.
pub(super) async fn drain(
    work: Arc<Mutex<VecDeque<Job>>>,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    verifier: IntegrityVerifier,
) -> Vec<(usize, DownloadResult)> {
    let mut done = Vec::new();
    loop {
        let next = match work.lock() {
            Ok(mut q) => q.pop_front(),
            Err(_) => None,
        };
        let Some(job) = next else { break };
        let index = job.index;
        done.push((index, fetch_one(&transport, &policy, &verifier, job).await));
    }
    done
}

async fn fetch_one(
    transport: &Arc<dyn Transport>,
    policy: &RetryPolicy,
    verifier: &IntegrityVerifier,
    job: Job,
) -> DownloadResult {
    let Job {
        location,
        destination,
        ..
    } = job;

    let outcome = run_with_retry(policy, |_attempt| {
        let transport = Arc::clone(transport);
        let url = location.url.clone();
        let dest = destination.clone();
        async move {
            tokio::task::spawn_blocking(move || transport.fetch_to_file(&url, &dest))
                .await
                .unwrap_or_else(|e| Err(TransferError::Storage(std::io::Error::other(e.to_string()))))
        }
    })
    .await;

    let mut result = DownloadResult {
        location,
        destination,
        bytes: 0,
        checksum: None,
        success: false,
        attempts: outcome.attempts,
        error: None,
        throttled: false,
    };

    let bytes = match outcome.result {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(url = %result.location.url, attempts = result.attempts, "download failed: {}", e);
            result.throttled = classify(&e) == ErrorKind::Throttled;
            result.error = Some(e.to_string());
            return result;
        }
    };
    result.bytes = bytes;

    let path = result.destination.clone();
    let verifier = verifier.clone();
    match tokio::task::spawn_blocking(move || verifier.checksum(&path)).await {
        Ok(Ok(digest)) => {
            result.checksum = Some(digest);
            result.success = true;
            tracing::debug!(file = %result.destination.display(), bytes, "downloaded");
        }
        Ok(Err(e)) => result.error = Some(format!("checksum: {:#}", e)),
        Err(e) => result.error = Some(format!("checksum task: {}", e)),
    }
    result
}
