//! libcurl transport: single GET streamed to `<dest>.part`, then renamed.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use super::{temp_path, Transport};
use crate::retry::TransferError;

/// Tunables passed to every curl handle.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Abort when slower than `low_speed_limit` bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    /// Whole-transfer ceiling.
    pub timeout: Duration,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            timeout: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    options: CurlOptions,
}

impl CurlTransport {
    pub fn new(options: CurlOptions) -> Self {
        Self { options }
    }

    fn configure(&self, easy: &mut curl::easy::Easy, url: &str) -> Result<(), curl::Error> {
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&self.options.user_agent)?;
        easy.connect_timeout(self.options.connect_timeout)?;
        easy.low_speed_limit(self.options.low_speed_limit)?;
        easy.low_speed_time(self.options.low_speed_time)?;
        easy.timeout(self.options.timeout)?;
        Ok(())
    }
}

impl Transport for CurlTransport {
    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, TransferError> {
        let part = temp_path(dest);
        let mut file = File::create(&part).map_err(TransferError::Storage)?;

        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, url)?;

        let mut written: u64 = 0;
        let mut write_err: Option<std::io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_err = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };

        let outcome = check_transfer(&mut easy, performed, write_err, written);
        if let Err(e) = outcome {
            drop(file);
            let _ = std::fs::remove_file(&part);
            return Err(e);
        }

        file.sync_all().map_err(TransferError::Storage)?;
        drop(file);
        std::fs::rename(&part, dest).map_err(TransferError::Storage)?;
        tracing::debug!(url, dest = %dest.display(), bytes = written, "transfer complete");
        Ok(written)
    }
}

fn check_transfer(
    easy: &mut curl::easy::Easy,
    performed: Result<(), curl::Error>,
    write_err: Option<std::io::Error>,
    written: u64,
) -> Result<(), TransferError> {
    if let Some(e) = write_err {
        return Err(TransferError::Storage(e));
    }
    performed?;
    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(TransferError::Http(code));
    }
    let announced = easy.content_length_download()?;
    if announced >= 0.0 && announced as u64 != written {
        return Err(TransferError::PartialTransfer {
            expected: announced as u64,
            received: written,
        });
    }
    Ok(())
}
