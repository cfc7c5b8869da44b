//! Logging init: append to a file under the XDG state dir, or fall back to stderr.
//!
//! The filter comes from `CBM_LOG`, then `RUST_LOG`, then [`DEFAULT_FILTER`].

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,cbm=debug,cbm_core=debug";

/// `$XDG_STATE_HOME/cbm/cbm.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cbm")?;
    Ok(xdg_dirs.get_state_home().join("cbm").join("cbm.log"))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("CBM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the file subscriber. Errors (unwritable state dir, subscriber
/// already set) are returned so the caller can use [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;

    tracing::info!(pid = std::process::id(), "cbm logging to {}", path.display());
    Ok(())
}

pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_lives_in_cbm_state_dir() {
        let path = log_file_path().unwrap();
        assert!(path.ends_with("cbm/cbm.log"), "{}", path.display());
    }

    #[test]
    fn default_filter_parses() {
        assert!(DEFAULT_FILTER.parse::<EnvFilter>().is_ok());
    }
}
