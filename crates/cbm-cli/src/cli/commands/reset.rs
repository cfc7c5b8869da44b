//! `cbm reset` – archive the ledger; downloaded files are left alone.

use anyhow::Result;
use std::path::Path;

use super::open_existing_ledger;

pub async fn run_reset(run_dir: &Path) -> Result<()> {
    let mut ledger = open_existing_ledger(run_dir).await?;
    let archive = ledger.reset().await?;
    println!("Ledger archived to {}", archive.display());
    Ok(())
}
