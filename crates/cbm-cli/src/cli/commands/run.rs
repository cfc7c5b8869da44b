//! `cbm run` – back up a catalog into a run directory.

use anyhow::Result;
use cbm_core::catalog_file::CatalogFile;
use cbm_core::config::CbmConfig;
use cbm_core::pipeline::Pipeline;
use cbm_core::transport::{CurlOptions, CurlTransport};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    pub strict: bool,
    pub start_at: Option<usize>,
    pub limit: Option<usize>,
}

pub async fn run_backup(
    cfg: &CbmConfig,
    catalog_path: &Path,
    run_dir: &Path,
    opts: &BackupOptions,
) -> Result<()> {
    let catalog = CatalogFile::load(catalog_path)?;
    let mut cfg = cfg.clone();
    cfg.strict |= opts.strict;

    let transport = CurlTransport::new(CurlOptions {
        user_agent: cfg.user_agent().to_string(),
        ..CurlOptions::default()
    });
    let mut pipeline = Pipeline::open(
        &cfg,
        run_dir,
        Box::new(catalog.surface()),
        Arc::new(transport),
    )
    .await?;

    println!(
        "Backing up {} ({} items) into {}",
        catalog_path.display(),
        catalog.items().len(),
        run_dir.display()
    );
    let started = Instant::now();
    let summary = pipeline
        .discover_and_run(
            &catalog,
            &catalog_path.display().to_string(),
            opts.start_at,
            opts.limit,
        )
        .await?;

    println!("{} in {:.1}s", summary, started.elapsed().as_secs_f64());
    if summary.partial + summary.failed > 0 {
        println!(
            "Some items had failures; see {}",
            run_dir.join(cbm_core::output::ERROR_LOG_FILE_NAME).display()
        );
    }
    Ok(())
}
