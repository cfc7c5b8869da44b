//! `manifest.jsonl`: one JSON object per processed item.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "manifest.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Every resource downloaded and verified.
    Complete,
    /// Some resources failed; see the error log.
    Partial,
    /// Extraction found nothing to download.
    NoResources,
    /// Permanent item fault before or during download.
    Failed,
}

/// One downloaded resource and where it landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub source_url: String,
    /// Relative to the run directory.
    pub file: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub item_id: String,
    pub title: String,
    pub ordinal: usize,
    pub outcome: ItemOutcome,
    #[serde(default)]
    pub files: Vec<ManifestFile>,
    /// Resources that could not be downloaded (named in the error log).
    #[serde(default)]
    pub failed: usize,
    pub recorded_at: i64,
}

/// Latest outcome counts, one per item id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestTotals {
    pub items: usize,
    pub complete: usize,
    pub partial: usize,
    pub no_resources: usize,
    pub failed: usize,
    pub files: usize,
}

#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    pub fn in_run_dir(run_dir: &Path) -> Self {
        Self {
            path: run_dir.join(MANIFEST_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &ManifestEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry).context("serialize manifest entry")?;
        line.push('\n');
        super::append_synced(&self.path, line.as_bytes())
    }

    /// All entries in file order. A torn final line (crash mid-append) is
    /// skipped; a malformed line elsewhere is an error.
    pub fn load(&self) -> Result<Vec<ManifestEntry>> {
        let f = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("open {}", self.path.display())),
        };
        let lines: Vec<String> = BufReader::new(f)
            .lines()
            .collect::<std::io::Result<_>>()
            .with_context(|| format!("read {}", self.path.display()))?;
        let last = lines.len().saturating_sub(1);
        let mut out = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ManifestEntry>(line) {
                Ok(entry) => out.push(entry),
                Err(e) if i == last => {
                    tracing::warn!(path = %self.path.display(), "ignoring torn manifest line: {}", e);
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("parse {} line {}", self.path.display(), i + 1)
                    })
                }
            }
        }
        Ok(out)
    }

    /// Latest entry per item id, ordered by ordinal.
    pub fn latest(&self) -> Result<Vec<ManifestEntry>> {
        let mut by_id: HashMap<String, ManifestEntry> = HashMap::new();
        for entry in self.load()? {
            by_id.insert(entry.item_id.clone(), entry);
        }
        let mut entries: Vec<ManifestEntry> = by_id.into_values().collect();
        entries.sort_by(|a, b| a.ordinal.cmp(&b.ordinal).then_with(|| a.item_id.cmp(&b.item_id)));
        Ok(entries)
    }

    pub fn totals(&self) -> Result<ManifestTotals> {
        let mut t = ManifestTotals::default();
        for entry in self.latest()? {
            t.items += 1;
            t.files += entry.files.len();
            match entry.outcome {
                ItemOutcome::Complete => t.complete += 1,
                ItemOutcome::Partial => t.partial += 1,
                ItemOutcome::NoResources => t.no_resources += 1,
                ItemOutcome::Failed => t.failed += 1,
            }
        }
        Ok(t)
    }
}
