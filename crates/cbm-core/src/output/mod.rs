//! Per-run output records written next to the downloaded files.
//!
//! Both files are append-only and synced before the orchestrator marks an
//! item done, so every completed ledger entry has its record on disk.

mod errlog;
mod manifest;

pub use errlog::{ErrorClass, ErrorLog, ERROR_LOG_FILE_NAME};
pub use manifest::{
    ItemOutcome, Manifest, ManifestEntry, ManifestFile, ManifestTotals, MANIFEST_FILE_NAME,
};

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Append `data` to `path` and fsync.
fn append_synced(path: &Path, data: &[u8]) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    f.write_all(data)
        .and_then(|_| f.sync_data())
        .with_context(|| format!("write {}", path.display()))
}
