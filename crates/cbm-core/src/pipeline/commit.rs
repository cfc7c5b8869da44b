//! Recording an item's outcome: checksums, manifest, error log, then ledger.

use anyhow::Result;

use super::{ItemAttempt, Pipeline, PipelineError, RunSummary};
use crate::catalog::CatalogItem;
use crate::downloader::DownloadResult;
use crate::output::{ErrorClass, ItemOutcome, ManifestEntry, ManifestFile};

impl Pipeline {
    pub(super) async fn commit(
        &self,
        item: &CatalogItem,
        attempt: Result<ItemAttempt>,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        match attempt {
            Ok(ItemAttempt::NoResources) => {
                tracing::info!(item = %item.id, "no resources");
                self.write_manifest(item, ItemOutcome::NoResources, Vec::new(), 0)?;
                summary.no_resources += 1;
            }
            Ok(ItemAttempt::Downloaded(results)) => {
                let (ok, failed): (Vec<DownloadResult>, Vec<DownloadResult>) =
                    results.into_iter().partition(|r| r.success);

                if !failed.is_empty() {
                    let lines: Vec<String> = failed.iter().map(describe_failure).collect();
                    self.errors
                        .record_many(item, ErrorClass::ResourceFailed, lines.iter().map(String::as_str))
                        .map_err(PipelineError::Output)?;
                    if self.options.strict {
                        return Err(PipelineError::StrictHalt {
                            item_id: item.id.clone(),
                            reason: format!("{} of {} resources failed", failed.len(), failed.len() + ok.len()),
                        });
                    }
                }

                let verified: Vec<(&DownloadResult, &str)> = ok
                    .iter()
                    .filter_map(|r| r.checksum.as_deref().map(|c| (r, c)))
                    .collect();
                self.verifier
                    .persist(verified.iter().map(|(r, c)| (r.destination.as_path(), *c)))
                    .map_err(PipelineError::Output)?;

                let files: Vec<ManifestFile> = verified
                    .iter()
                    .map(|(r, c)| ManifestFile {
                        source_url: r.location.url.clone(),
                        file: self.verifier.relative(&r.destination),
                        bytes: r.bytes,
                        sha256: c.to_string(),
                    })
                    .collect();
                let outcome = if failed.is_empty() {
                    summary.completed += 1;
                    ItemOutcome::Complete
                } else {
                    tracing::warn!(item = %item.id, failed = failed.len(), "item partially downloaded");
                    summary.partial += 1;
                    ItemOutcome::Partial
                };
                summary.downloads += files.len();
                self.write_manifest(item, outcome, files, failed.len())?;
            }
            Err(e) => {
                let detail = format!("{:#}", e);
                tracing::error!(item = %item.id, "item failed: {}", detail);
                self.errors
                    .record(item, ErrorClass::ItemFault, &detail)
                    .map_err(PipelineError::Output)?;
                if self.options.strict {
                    return Err(PipelineError::StrictHalt {
                        item_id: item.id.clone(),
                        reason: detail,
                    });
                }
                self.write_manifest(item, ItemOutcome::Failed, Vec::new(), 0)?;
                summary.failed += 1;
            }
        }

        self.ledger
            .mark_done(&item.id)
            .await
            .map_err(PipelineError::Ledger)
    }

    fn write_manifest(
        &self,
        item: &CatalogItem,
        outcome: ItemOutcome,
        files: Vec<ManifestFile>,
        failed: usize,
    ) -> Result<(), PipelineError> {
        self.manifest
            .append(&ManifestEntry {
                item_id: item.id.clone(),
                title: item.title.clone(),
                ordinal: item.ordinal,
                outcome,
                files,
                failed,
                recorded_at: crate::ledger::unix_timestamp(),
            })
            .map_err(PipelineError::Output)
    }
}

fn describe_failure(r: &DownloadResult) -> String {
    format!(
        "{} -> {}: {} (after {} attempts{})",
        r.location.url,
        r.destination.display(),
        r.error.as_deref().unwrap_or("unknown error"),
        r.attempts,
        if r.throttled { ", throttled" } else { "" }
    )
}
