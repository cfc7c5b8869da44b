//! CLI for the CBM catalog backup manager.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cbm_core::config;
use std::path::{Path, PathBuf};

use commands::{run_backup, run_checksum, run_reset, run_status, run_verify, BackupOptions};

/// Top-level CLI for the CBM backup manager.
#[derive(Debug, Parser)]
#[command(name = "cbm")]
#[command(about = "CBM: resumable, rate-limit aware catalog backup", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Back up every item of a catalog file, skipping items already done.
    Run {
        /// JSON catalog describing the items and their resources.
        catalog: PathBuf,
        /// Backup run directory (default: current directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Stop at the first failed item instead of recording it and moving on.
        #[arg(long)]
        strict: bool,
        /// First item to process (1-based position in the catalog).
        #[arg(long, value_name = "N")]
        start_at: Option<usize>,
        /// Process at most N items.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Show progress of a backup run directory.
    Status {
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Archive the progress ledger so the next run starts from scratch.
    Reset {
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Re-hash every recorded file and report mismatches.
    Verify {
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: String,
    },
}

fn run_dir(out: Option<PathBuf>) -> Result<PathBuf> {
    match out {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                catalog,
                out,
                strict,
                start_at,
                limit,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let opts = BackupOptions {
                    strict,
                    start_at,
                    limit,
                };
                run_backup(&cfg, &catalog, &run_dir(out)?, &opts).await?;
            }
            CliCommand::Status { out } => run_status(&run_dir(out)?).await?,
            CliCommand::Reset { out } => run_reset(&run_dir(out)?).await?,
            CliCommand::Verify { out } => run_verify(&run_dir(out)?).await?,
            CliCommand::Checksum { path } => run_checksum(Path::new(&path)).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
