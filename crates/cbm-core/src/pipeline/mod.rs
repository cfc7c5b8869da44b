//! Pipeline orchestrator: discovery → extraction → download → verify → ledger.
//!
//! Items run strictly one after another in discovery order. Per item the
//! checksum record, manifest and error log are synced before the ledger marks
//! the item done, so a crash leaves the ledger consistent with the outputs.
//! Rate-limit failures anywhere in an item put the run to sleep and retry the
//! same item; any other item failure is recorded and the run moves on (or
//! halts, in strict mode).

mod commit;
mod error;
mod summary;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::backoff::BackoffController;
use crate::catalog::{select_slice, CatalogItem, DiscoveryService};
use crate::checksum::IntegrityVerifier;
use crate::config::{CbmConfig, PacingConfig};
use crate::downloader::{DownloadManager, DownloadResult};
use crate::extractor::{AutomationSurface, ResourceExtractor};
use crate::ledger::ProgressLedger;
use crate::output::{ErrorLog, Manifest};
use crate::retry::RetryPolicy;
use crate::transport::Transport;
use crate::url_model::{item_dir_name, NamingRules};

pub use error::PipelineError;
pub use summary::RunSummary;

/// Behavior switches that are not owned by a single component.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Halt on the first item failure instead of marking it done.
    pub strict: bool,
    pub max_dir_name_len: usize,
    pub pacing: PacingConfig,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&CbmConfig::default())
    }
}

impl PipelineOptions {
    pub fn from_config(cfg: &CbmConfig) -> Self {
        Self {
            strict: cfg.strict,
            max_dir_name_len: cfg.max_dir_name_len,
            pacing: cfg.pacing_or_default(),
        }
    }
}

/// What one attempt at an item produced.
enum ItemAttempt {
    NoResources,
    Downloaded(Vec<DownloadResult>),
}

pub struct Pipeline {
    run_dir: PathBuf,
    ledger: ProgressLedger,
    extractor: ResourceExtractor,
    downloads: DownloadManager,
    backoff: BackoffController,
    verifier: IntegrityVerifier,
    manifest: Manifest,
    errors: ErrorLog,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        run_dir: &Path,
        ledger: ProgressLedger,
        extractor: ResourceExtractor,
        downloads: DownloadManager,
        backoff: BackoffController,
        options: PipelineOptions,
    ) -> Self {
        Self {
            run_dir: run_dir.to_path_buf(),
            ledger,
            extractor,
            downloads,
            backoff,
            verifier: IntegrityVerifier::new(run_dir),
            manifest: Manifest::in_run_dir(run_dir),
            errors: ErrorLog::in_run_dir(run_dir),
            options,
        }
    }

    /// Wire every component from `cfg`, opening (or creating) the run directory
    /// and its ledger.
    pub async fn open(
        cfg: &CbmConfig,
        run_dir: &Path,
        surface: Box<dyn AutomationSurface>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let ledger = ProgressLedger::open_in(run_dir).await?;
        let extractor = ResourceExtractor::new(surface, &cfg.extraction_or_default());
        let downloads = DownloadManager::new(
            transport,
            cfg.concurrency,
            RetryPolicy::from(&cfg.retry_or_default()),
            NamingRules::new(cfg.file_extension.clone(), cfg.max_stem_len),
            IntegrityVerifier::new(run_dir),
        );
        let backoff = BackoffController::from_config(&cfg.backoff_or_default());
        Ok(Self::new(
            run_dir,
            ledger,
            extractor,
            downloads,
            backoff,
            PipelineOptions::from_config(cfg),
        ))
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn backoff(&self) -> &BackoffController {
        &self.backoff
    }

    /// List the catalog (with rate-limit backoff), restrict it to the
    /// requested slice and run it.
    pub async fn discover_and_run(
        &mut self,
        discovery: &dyn DiscoveryService,
        source_ref: &str,
        start_at: Option<usize>,
        limit: Option<usize>,
    ) -> Result<RunSummary, PipelineError> {
        let mut waits = 0;
        let items = loop {
            match discovery.list_items(source_ref).await {
                Ok(items) => {
                    self.backoff.record_success();
                    break items;
                }
                Err(e) => match self.backoff.on_failure(&e) {
                    Some(wait) => {
                        waits += 1;
                        tracing::warn!(
                            attempt = self.backoff.attempt(),
                            wait_secs = wait.as_secs_f64(),
                            "rate limited during discovery: {:#}",
                            e
                        );
                        tokio::time::sleep(wait).await;
                    }
                    None => return Err(PipelineError::Discovery(e)),
                },
            }
        };
        let total = items.len();
        let items = select_slice(items, start_at, limit);
        tracing::info!(source = source_ref, total, selected = items.len(), "catalog discovered");

        let mut summary = self.run(&items).await?;
        summary.rate_limit_waits += waits;
        Ok(summary)
    }

    /// Process `items` in order, skipping those already in the ledger.
    pub async fn run(&mut self, items: &[CatalogItem]) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();
        let mut processed = 0usize;

        for (pos, item) in items.iter().enumerate() {
            if self
                .ledger
                .is_done(&item.id)
                .await
                .map_err(PipelineError::Ledger)?
            {
                tracing::debug!(item = %item.id, "already done, skipping");
                summary.skipped += 1;
                continue;
            }

            tracing::info!(item = %item.id, ordinal = item.ordinal, title = %item.title, "processing item");
            let attempt = self.attempt_until_not_rate_limited(item, &mut summary).await;
            self.commit(item, attempt, &mut summary).await?;

            processed += 1;
            if pos + 1 < items.len() {
                self.pace(processed).await;
            }
        }

        tracing::info!(%summary, "run finished");
        Ok(summary)
    }

    /// Attempt `item` until it yields something other than a rate-limit
    /// error. Waits escalate and cap.
    async fn attempt_until_not_rate_limited(
        &mut self,
        item: &CatalogItem,
        summary: &mut RunSummary,
    ) -> Result<ItemAttempt> {
        loop {
            // Transfers that stay throttled after their local retries are
            // per-resource failures, recorded at commit; only extraction and
            // download-manager errors drive item-level backoff.
            let wait = match self.attempt_item(item).await {
                Ok(attempt) => {
                    self.backoff.record_success();
                    return Ok(attempt);
                }
                Err(e) => match self.backoff.on_failure(&e) {
                    Some(wait) => {
                        tracing::warn!(item = %item.id, "rate limited: {:#}", e);
                        wait
                    }
                    None => return Err(e),
                },
            };
            summary.rate_limit_waits += 1;
            tracing::info!(
                item = %item.id,
                attempt = self.backoff.attempt(),
                wait_secs = wait.as_secs_f64(),
                "backing off before retrying item"
            );
            tokio::time::sleep(wait).await;
        }
    }

    async fn attempt_item(&mut self, item: &CatalogItem) -> Result<ItemAttempt> {
        let locations = self.extractor.extract(item).await?;
        if locations.is_empty() {
            return Ok(ItemAttempt::NoResources);
        }
        let dir = self
            .run_dir
            .join(item_dir_name(item, self.options.max_dir_name_len));
        let results = self.downloads.fetch_all(&locations, &dir).await?;
        Ok(ItemAttempt::Downloaded(results))
    }

    async fn pace(&self, processed: usize) {
        let pacing = &self.options.pacing;
        let pause = if pacing.batch_size > 0 && processed % pacing.batch_size == 0 {
            tracing::info!(processed, "batch boundary, pausing");
            pacing.batch_pause()
        } else {
            pacing.item_delay()
        };
        if pause > Duration::ZERO {
            tokio::time::sleep(pause).await;
        }
    }
}
