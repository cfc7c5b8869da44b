//! Bounded-concurrency download of one item's resources.
//!
//! A fixed pool of workers (at most `concurrency`) pulls locations from a
//! shared queue. Each transfer attempt runs on the blocking pool through the
//! [`Transport`]; transient failures are retried with [`RetryPolicy`]. A
//! failed resource never aborts its siblings.

mod worker;

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

use crate::catalog::ResourceLocation;
use crate::checksum::IntegrityVerifier;
use crate::retry::RetryPolicy;
use crate::transport::Transport;
use crate::url_model::NamingRules;

/// Outcome of one resource transfer.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub location: ResourceLocation,
    pub destination: PathBuf,
    pub bytes: u64,
    /// Lowercase hex SHA-256; set only on success.
    pub checksum: Option<String>,
    pub success: bool,
    pub attempts: u32,
    pub error: Option<String>,
    /// The final failure was the server asking us to slow down (429/503).
    pub throttled: bool,
}

pub struct DownloadManager {
    transport: Arc<dyn Transport>,
    concurrency: usize,
    retry: RetryPolicy,
    naming: NamingRules,
    verifier: IntegrityVerifier,
}

impl DownloadManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        concurrency: usize,
        retry: RetryPolicy,
        naming: NamingRules,
        verifier: IntegrityVerifier,
    ) -> Self {
        Self {
            transport,
            concurrency: concurrency.max(1),
            retry,
            naming,
            verifier,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Download every location into `dest_dir`. Returns one result per input,
    /// in input order. Err only for failures outside individual transfers
    /// (destination directory, worker panic).
    pub async fn fetch_all(
        &self,
        locations: &[ResourceLocation],
        dest_dir: &Path,
    ) -> Result<Vec<DownloadResult>> {
        if locations.is_empty() {
            return Ok(Vec::new());
        }
        tokio::fs::create_dir_all(dest_dir)
            .await
            .with_context(|| format!("create {}", dest_dir.display()))?;

        let names = self.naming.plan(locations);
        let queue: VecDeque<worker::Job> = locations
            .iter()
            .cloned()
            .zip(names)
            .enumerate()
            .map(|(index, (location, name))| worker::Job {
                index,
                destination: dest_dir.join(name),
                location,
            })
            .collect();
        let count = queue.len();
        let work = Arc::new(Mutex::new(queue));

        let mut set = JoinSet::new();
        for _ in 0..self.concurrency.min(count) {
            set.spawn(worker::drain(
                Arc::clone(&work),
                Arc::clone(&self.transport),
                self.retry,
                self.verifier.clone(),
            ));
        }

        let mut slots: Vec<Option<DownloadResult>> = vec![None; count];
        while let Some(joined) = set.join_next().await {
            let finished = joined.context("download worker panicked")?;
            for (index, result) in finished {
                slots[index] = Some(result);
            }
        }

        let results: Vec<DownloadResult> = slots.into_iter().flatten().collect();
        anyhow::ensure!(
            results.len() == count,
            "download workers returned {} of {} results",
            results.len(),
            count
        );
        let ok = results.iter().filter(|r| r.success).count();
        tracing::debug!(dir = %dest_dir.display(), ok, failed = count - ok, "item downloads finished");
        Ok(results)
    }
}
