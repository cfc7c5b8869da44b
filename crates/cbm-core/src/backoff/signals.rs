//! Recognize rate-limit signals in errors.

use crate::retry::{self, ErrorKind, TransferError};

/// Outcome of classifying a failure for the backoff controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The remote asked us to slow down; retry the same item after a wait.
    RateLimited,
    /// Anything else; the backoff state is left untouched.
    Other,
}

/// Case-insensitive needles matched against error text.
#[derive(Debug, Clone)]
pub struct RateLimitSignals {
    needles: Vec<String>,
}

impl RateLimitSignals {
    pub fn new<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            needles: needles
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// True if `text` contains any configured signal.
    pub fn matches_text(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.needles.iter().any(|n| lower.contains(n.as_str()))
    }

    /// Classify an error: a typed throttling status anywhere in the chain, or a
    /// known signal in the rendered message.
    pub fn classify(&self, err: &anyhow::Error) -> FailureClass {
        let throttled = err.chain().any(|cause| {
            cause
                .downcast_ref::<TransferError>()
                .map(|te| retry::classify(te) == ErrorKind::Throttled)
                .unwrap_or(false)
        });
        if throttled || self.matches_text(&format!("{:#}", err)) {
            FailureClass::RateLimited
        } else {
            FailureClass::Other
        }
    }
}

impl Default for RateLimitSignals {
    fn default() -> Self {
        Self::new(crate::config::BackoffConfig::default().rate_limit_signals)
    }
}
