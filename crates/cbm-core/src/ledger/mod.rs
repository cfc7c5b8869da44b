//! Persistent progress ledger (SQLite via sqlx).
//!
//! Records which catalog items have been fully backed up so a restarted run
//! skips them. Rows are only ever inserted; `reset` archives the database file
//! and starts an empty one.

mod db;

pub use db::{ProgressLedger, ProgressRecord, LEDGER_FILE_NAME};
pub(crate) use db::unix_timestamp;
