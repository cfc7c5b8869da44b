//! SHA-256 integrity checks for downloaded files.
//!
//! Digests are computed after a transfer completes, not inline with it, and
//! recorded in a `sha256sum`-compatible file at the root of the run directory.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

const BUF_SIZE: usize = 64 * 1024;

/// Name of the checksum record inside a run directory.
pub const CHECKSUM_FILE_NAME: &str = "checksums.sha256";

/// Compute SHA-256 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Append-only `<hex>  <relative path>` file. The last line for a path wins.
#[derive(Debug, Clone)]
pub struct ChecksumRecord {
    path: PathBuf,
}

impl ChecksumRecord {
    pub fn in_run_dir(run_dir: &Path) -> Self {
        Self {
            path: run_dir.join(CHECKSUM_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append entries and fsync before returning.
    pub fn append(&self, entries: &[(String, String)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let mut buf = String::new();
        for (rel, digest) in entries {
            buf.push_str(&format!("{}  {}\n", digest, rel));
        }
        f.write_all(buf.as_bytes())
            .and_then(|_| f.sync_data())
            .with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }

    /// Relative path → digest. Missing file reads as empty.
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        let f = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e).with_context(|| format!("open {}", self.path.display())),
        };
        let mut out = BTreeMap::new();
        for line in BufReader::new(f).lines() {
            let line = line.with_context(|| format!("read {}", self.path.display()))?;
            if let Some((digest, rel)) = line.split_once("  ") {
                out.insert(rel.to_string(), digest.trim().to_string());
            }
        }
        Ok(out)
    }
}

/// Outcome of re-verifying a run directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub matched: usize,
    pub mismatched: Vec<String>,
    pub missing: Vec<String>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty() && self.missing.is_empty()
    }
}

/// Computes, records and re-checks digests for one run directory.
#[derive(Debug, Clone)]
pub struct IntegrityVerifier {
    run_dir: PathBuf,
    record: ChecksumRecord,
}

impl IntegrityVerifier {
    pub fn new(run_dir: &Path) -> Self {
        Self {
            run_dir: run_dir.to_path_buf(),
            record: ChecksumRecord::in_run_dir(run_dir),
        }
    }

    pub fn checksum(&self, path: &Path) -> Result<String> {
        sha256_path(path)
    }

    /// Path as stored in the record: relative to the run dir when possible.
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.run_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Persist `(destination, digest)` pairs.
    pub fn persist<'a, I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a Path, &'a str)>,
    {
        let rows: Vec<(String, String)> = entries
            .into_iter()
            .map(|(p, d)| (self.relative(p), d.to_string()))
            .collect();
        self.record.append(&rows)
    }

    /// Re-hash every recorded file and compare.
    pub fn verify_all(&self) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();
        for (rel, expected) in self.record.load()? {
            let path = self.run_dir.join(&rel);
            if !path.exists() {
                report.missing.push(rel);
                continue;
            }
            if self.checksum(&path)? == expected {
                report.matched += 1;
            } else {
                report.mismatched.push(rel);
            }
        }
        Ok(report)
    }
}
