use std::fmt;

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items whose resources all downloaded.
    pub completed: usize,
    /// Items with at least one failed resource.
    pub partial: usize,
    /// Items already in the ledger.
    pub skipped: usize,
    pub no_resources: usize,
    /// Items that hit a permanent fault.
    pub failed: usize,
    /// Files downloaded and verified.
    pub downloads: usize,
    /// Rate-limit sleeps taken, discovery included.
    pub rate_limit_waits: usize,
}

impl RunSummary {
    /// Items processed (not skipped) in this run.
    pub fn processed(&self) -> usize {
        self.completed + self.partial + self.no_resources + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} complete, {} partial, {} without resources, {} failed, {} skipped; {} files downloaded",
            self.completed,
            self.partial,
            self.no_resources,
            self.failed,
            self.skipped,
            self.downloads
        )?;
        if self.rate_limit_waits > 0 {
            write!(f, " ({} rate-limit waits)", self.rate_limit_waits)?;
        }
        Ok(())
    }
}
