//! `cbm status` – progress of a run directory.

use anyhow::Result;
use cbm_core::output::{ErrorLog, Manifest};
use std::path::Path;

use super::open_existing_ledger;

pub async fn run_status(run_dir: &Path) -> Result<()> {
    let ledger = open_existing_ledger(run_dir).await?;
    let record = ledger.record().await?;
    let totals = Manifest::in_run_dir(run_dir).totals()?;
    let errors = ErrorLog::in_run_dir(run_dir).lines()?.len();

    println!("Run directory: {}", run_dir.display());
    println!("Items done:    {}", record.completed.len());
    match record.last_updated {
        Some(ts) => println!("Last update:   {} (unix)", ts),
        None => println!("Last update:   -"),
    }
    println!(
        "Manifest:      {} complete, {} partial, {} without resources, {} failed, {} files",
        totals.complete, totals.partial, totals.no_resources, totals.failed, totals.files
    );
    println!("Error log:     {} entries", errors);
    Ok(())
}
