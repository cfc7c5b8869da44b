#![allow(dead_code)]

pub mod fakes;
pub mod media_server;

use cbm_core::config::{BackoffConfig, CbmConfig, ExtractionConfig, RetryConfig};

/// Defaults scaled down to milliseconds so tests never really sleep.
pub fn fast_config() -> CbmConfig {
    CbmConfig {
        concurrency: 3,
        retry: Some(RetryConfig {
            max_attempts: 3,
            base_delay_secs: 0.001,
            max_delay_secs: 0,
        }),
        backoff: Some(BackoffConfig {
            schedule_secs: vec![0.005, 0.010, 0.020, 0.030],
            ..BackoffConfig::default()
        }),
        extraction: Some(ExtractionConfig {
            observe_timeout_secs: 0.05,
            settle_ms: 0,
        }),
        ..CbmConfig::default()
    }
}
