//! CLI command handlers, one per file.

mod checksum;
mod reset;
mod run;
mod status;
mod verify;

pub use checksum::run_checksum;
pub use reset::run_reset;
pub use run::{run_backup, BackupOptions};
pub use status::run_status;
pub use verify::run_verify;

use anyhow::Result;
use cbm_core::ledger::{ProgressLedger, LEDGER_FILE_NAME};
use std::path::Path;

/// Open the ledger of an existing run directory without creating one.
async fn open_existing_ledger(run_dir: &Path) -> Result<ProgressLedger> {
    let path = run_dir.join(LEDGER_FILE_NAME);
    if !path.exists() {
        anyhow::bail!("no backup found in {} (missing {})", run_dir.display(), LEDGER_FILE_NAME);
    }
    ProgressLedger::open_at(&path).await
}
