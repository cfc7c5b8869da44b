//! Backoff state machine: `Normal` ⇄ `Backoff(n)`.

use std::time::Duration;

use super::signals::{FailureClass, RateLimitSignals};
use crate::config::BackoffConfig;

/// Current backoff state. `Backoff(n)` never exceeds the schedule length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffState {
    Normal,
    Backoff(u32),
}

/// Stateful rate-limit policy shared by every stage of one run.
#[derive(Debug, Clone)]
pub struct BackoffController {
    schedule: Vec<Duration>,
    signals: RateLimitSignals,
    state: BackoffState,
}

impl BackoffController {
    /// An empty schedule means rate-limit waits are zero-length.
    pub fn new(schedule: Vec<Duration>, signals: RateLimitSignals) -> Self {
        Self {
            schedule,
            signals,
            state: BackoffState::Normal,
        }
    }

    pub fn from_config(cfg: &BackoffConfig) -> Self {
        Self::new(
            cfg.schedule(),
            RateLimitSignals::new(&cfg.rate_limit_signals),
        )
    }

    pub fn state(&self) -> BackoffState {
        self.state
    }

    /// Number of consecutive rate-limit failures since the last success (capped).
    pub fn attempt(&self) -> u32 {
        match self.state {
            BackoffState::Normal => 0,
            BackoffState::Backoff(n) => n,
        }
    }

    pub fn classify(&self, err: &anyhow::Error) -> FailureClass {
        self.signals.classify(err)
    }

    /// Wait for the nth consecutive rate-limit failure (1-based). Past the end
    /// of the schedule the last entry is reused.
    pub fn wait(&self, n: u32) -> Duration {
        if self.schedule.is_empty() {
            return Duration::ZERO;
        }
        let idx = (n.max(1) as usize - 1).min(self.schedule.len() - 1);
        self.schedule[idx]
    }

    /// Record a rate-limit failure and return how long to sleep before retrying.
    pub fn record_rate_limited(&mut self) -> Duration {
        let cap = self.schedule.len().max(1) as u32;
        let next = match self.state {
            BackoffState::Normal => 1,
            BackoffState::Backoff(n) => (n + 1).min(cap),
        };
        self.state = BackoffState::Backoff(next);
        self.wait(next)
    }

    /// Feed any failure through the state machine. Returns the wait when the
    /// failure is a rate limit, `None` otherwise (state unchanged).
    pub fn on_failure(&mut self, err: &anyhow::Error) -> Option<Duration> {
        match self.classify(err) {
            FailureClass::RateLimited => Some(self.record_rate_limited()),
            FailureClass::Other => None,
        }
    }

    pub fn record_success(&mut self) {
        self.state = BackoffState::Normal;
    }
}

impl Default for BackoffController {
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}
