//! `errors.log`: human-readable per-item failures.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::catalog::CatalogItem;

pub const ERROR_LOG_FILE_NAME: &str = "errors.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// One resource exhausted its local retries.
    ResourceFailed,
    /// Extraction or the item as a whole failed permanently.
    ItemFault,
    /// Discovery of the catalog failed.
    Discovery,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorClass::ResourceFailed => "resource-failed",
            ErrorClass::ItemFault => "item-fault",
            ErrorClass::Discovery => "discovery",
        })
    }
}

/// Line format: `<unix ts>\t<class>\t<item id>\t<title>\t<detail>`.
/// Tabs and newlines inside fields are flattened to spaces.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn in_run_dir(run_dir: &Path) -> Self {
        Self {
            path: run_dir.join(ERROR_LOG_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, item: &CatalogItem, class: ErrorClass, detail: &str) -> Result<()> {
        self.record_many(item, class, std::iter::once(detail))
    }

    /// Several lines for one item in a single synced write.
    pub fn record_many<'a, I>(&self, item: &CatalogItem, class: ErrorClass, details: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ts = crate::ledger::unix_timestamp();
        let mut buf = String::new();
        for detail in details {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\n",
                ts,
                class,
                flatten(&item.id),
                flatten(&item.title),
                flatten(detail)
            ));
        }
        if buf.is_empty() {
            return Ok(());
        }
        super::append_synced(&self.path, buf.as_bytes())
            .with_context(|| format!("record {} for item {}", class, item.id))
    }

    /// Raw lines, for status output and tests. Missing file reads as empty.
    pub fn lines(&self) -> Result<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(s.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("read {}", self.path.display())),
        }
    }
}

fn flatten(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_writes_one_line_per_detail() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::in_run_dir(dir.path());
        let item = CatalogItem::new("c-5", "Five\tTabs", 5);
        log.record_many(
            &item,
            ErrorClass::ResourceFailed,
            ["https://cdn/a.mp3: HTTP 404", "https://cdn/b.mp3: HTTP 503"],
        )
        .unwrap();
        log.record(&item, ErrorClass::ItemFault, "boom\nsecond line").unwrap();

        let lines = log.lines().unwrap();
        assert_eq!(lines.len(), 3);
        let fields: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(fields[1], "resource-failed");
        assert_eq!(fields[2], "c-5");
        assert_eq!(fields[3], "Five Tabs");
        assert_eq!(fields[4], "https://cdn/a.mp3: HTTP 404");
        assert!(lines[2].ends_with("item-fault\tc-5\tFive Tabs\tboom second line"));
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ErrorLog::in_run_dir(dir.path()).lines().unwrap().is_empty());
    }
}
