//! SQLite-backed ledger implementation.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File name of the ledger inside a backup run directory.
pub const LEDGER_FILE_NAME: &str = "ledger.db";

/// Snapshot of the ledger contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    pub completed: HashSet<String>,
    /// Unix seconds of the most recent `mark_done`, if any.
    pub last_updated: Option<i64>,
}

/// Handle to the durable record of completed catalog items.
///
/// Single writer: the orchestrator. The pool holds one connection, journal mode
/// is DELETE (no sidecar files to carry along on reset) and every commit is
/// fsynced (`synchronous = FULL`).
pub struct ProgressLedger {
    pool: Pool<Sqlite>,
    path: PathBuf,
}

impl ProgressLedger {
    /// Open (or create) the ledger inside `run_dir`.
    pub async fn open_in(run_dir: &Path) -> Result<Self> {
        Self::open_at(run_dir.join(LEDGER_FILE_NAME)).await
    }

    /// Open (or create) the ledger at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create ledger dir: {}", parent.display()))?;
        }
        let pool = connect(&path).await?;
        let ledger = ProgressLedger { pool, path };
        ledger.migrate().await?;
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS completed_items (
                item_id TEXT PRIMARY KEY NOT NULL,
                completed_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("migrate ledger")?;
        Ok(())
    }

    pub async fn is_done(&self, item_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM completed_items WHERE item_id = ?1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
            .context("query ledger")?;
        Ok(row.is_some())
    }

    /// Record `item_id` as complete. Durable once this returns; marking an
    /// already-complete item keeps the original timestamp.
    pub async fn mark_done(&self, item_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO completed_items (item_id, completed_at)
            VALUES (?1, ?2)
            "#,
        )
        .bind(item_id)
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await
        .with_context(|| format!("mark item {} done", item_id))?;
        Ok(())
    }

    pub async fn load_all(&self) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT item_id FROM completed_items")
            .fetch_all(&self.pool)
            .await
            .context("load ledger")?;
        Ok(rows.iter().map(|r| r.get::<String, _>("item_id")).collect())
    }

    pub async fn record(&self) -> Result<ProgressRecord> {
        let completed = self.load_all().await?;
        let row = sqlx::query("SELECT MAX(completed_at) AS last FROM completed_items")
            .fetch_one(&self.pool)
            .await
            .context("query ledger timestamp")?;
        let last_updated: Option<i64> = row
            .try_get("last")
            .context("decode ledger timestamp")?;
        Ok(ProgressRecord {
            completed,
            last_updated,
        })
    }

    /// Archive the current ledger as `<name>.bak-<unix-ts>` and start an empty one.
    /// Returns the archive path. Nothing is deleted.
    pub async fn reset(&mut self) -> Result<PathBuf> {
        let archive = archive_path(&self.path);
        self.archive_to(archive).await
    }

    /// On a failed rename the ledger is reopened in place, so the handle
    /// stays usable and keeps its records.
    pub(super) async fn archive_to(&mut self, archive: PathBuf) -> Result<PathBuf> {
        self.pool.close().await;
        let renamed = tokio::fs::rename(&self.path, &archive).await.with_context(|| {
            format!(
                "archive ledger {} -> {}",
                self.path.display(),
                archive.display()
            )
        });
        self.pool = connect(&self.path).await?;
        self.migrate().await?;
        renamed?;
        tracing::info!(archive = %archive.display(), "ledger reset");
        Ok(archive)
    }
}

async fn connect(path: &Path) -> Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete)
        .synchronous(SqliteSynchronous::Full);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("open ledger: {}", path.display()))
}

/// Pick a non-existing `<path>.bak-<ts>[-n]` name.
fn archive_path(path: &Path) -> PathBuf {
    let ts = unix_timestamp();
    let base = format!("{}.bak-{}", path.display(), ts);
    let mut candidate = PathBuf::from(&base);
    let mut n = 1;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{}-{}", base, n));
        n += 1;
    }
    candidate
}

/// Current time as Unix seconds.
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
