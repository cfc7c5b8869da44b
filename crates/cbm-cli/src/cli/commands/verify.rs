//! `cbm verify` – re-hash recorded files.

use anyhow::Result;
use cbm_core::checksum::IntegrityVerifier;
use std::path::Path;

pub async fn run_verify(run_dir: &Path) -> Result<()> {
    let verifier = IntegrityVerifier::new(run_dir);
    let report = tokio::task::spawn_blocking(move || verifier.verify_all()).await??;

    for rel in &report.mismatched {
        println!("MISMATCH  {}", rel);
    }
    for rel in &report.missing {
        println!("MISSING   {}", rel);
    }
    println!(
        "{} ok, {} mismatched, {} missing",
        report.matched,
        report.mismatched.len(),
        report.missing.len()
    );
    if !report.is_clean() {
        anyhow::bail!("verification failed in {}", run_dir.display());
    }
    Ok(())
}
