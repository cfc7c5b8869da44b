//! Fetch-to-file transport seam.
//!
//! The download manager only needs "stream this URL into that file". The
//! shipped implementation uses libcurl; tests substitute in-memory fakes.

mod http;

use std::path::{Path, PathBuf};

use crate::retry::TransferError;

pub use self::http::{CurlOptions, CurlTransport};

/// Suffix for in-progress files; renamed away on success.
pub const TEMP_SUFFIX: &str = ".part";

/// Blocking fetch primitive. Called from the blocking thread pool, one call per
/// attempt; implementations must overwrite any existing file at `dest`.
pub trait Transport: Send + Sync + 'static {
    /// Stream `url` into `dest`, returning the number of bytes written.
    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, TransferError>;
}

/// `dest` + `.part`.
pub fn temp_path(dest: &Path) -> PathBuf {
    let mut s = dest.as_os_str().to_owned();
    s.push(TEMP_SUFFIX);
    PathBuf::from(s)
}
