use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Browser-like user agent; some catalogs refuse default library agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Seconds from config as a Duration. Negative and NaN read as zero, values
/// too large for a Duration saturate.
pub(crate) fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

/// Local transfer retry parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per resource (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (1.0 gives 1s, 2s, 4s...).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

/// Rate-limit backoff schedule and the signals that trigger it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Escalating waits in seconds; repeated failures past the end reuse the last entry.
    pub schedule_secs: Vec<f64>,
    /// Case-insensitive needles searched for in error text.
    #[serde(default = "default_rate_limit_signals")]
    pub rate_limit_signals: Vec<String>,
}

fn default_rate_limit_signals() -> Vec<String> {
    [
        "rate-limited",
        "rate limited",
        "too many requests",
        "http error 429",
        "http 429",
        "try again later",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            schedule_secs: vec![300.0, 600.0, 1200.0, 1800.0],
            rate_limit_signals: default_rate_limit_signals(),
        }
    }
}

impl BackoffConfig {
    pub fn schedule(&self) -> Vec<Duration> {
        self.schedule_secs
            .iter()
            .map(|&s| secs(s))
            .collect()
    }
}

/// How long the extractor waits on each triggered affordance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Wait for a captured resource after triggering an affordance.
    pub observe_timeout_secs: f64,
    /// Grace period after a capture before releasing the affordance.
    pub settle_ms: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            observe_timeout_secs: 6.0,
            settle_ms: 500,
        }
    }
}

impl ExtractionConfig {
    pub fn observe_timeout(&self) -> Duration {
        secs(self.observe_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Politeness between catalog items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Fixed pause after each processed item (0 = none).
    #[serde(default)]
    pub item_delay_secs: f64,
    /// Pause for `batch_pause_secs` after this many processed items (0 = off).
    #[serde(default)]
    pub batch_size: usize,
    #[serde(default = "default_batch_pause_secs")]
    pub batch_pause_secs: f64,
}

fn default_batch_pause_secs() -> f64 {
    300.0
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            item_delay_secs: 0.0,
            batch_size: 0,
            batch_pause_secs: default_batch_pause_secs(),
        }
    }
}

impl PacingConfig {
    pub fn item_delay(&self) -> Duration {
        secs(self.item_delay_secs)
    }

    pub fn batch_pause(&self) -> Duration {
        secs(self.batch_pause_secs)
    }
}

/// Global configuration loaded from `~/.config/cbm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CbmConfig {
    /// Maximum simultaneous transfers within one catalog item.
    pub concurrency: usize,
    /// Extension appended to every destination filename (without the dot).
    pub file_extension: String,
    /// Upper bound for a destination filename stem, in bytes.
    pub max_stem_len: usize,
    /// Upper bound for a per-item directory name, in bytes.
    #[serde(default = "default_dir_name_len")]
    pub max_dir_name_len: usize,
    /// Halt the run on any item failure instead of marking the item done.
    #[serde(default)]
    pub strict: bool,
    /// User-Agent header for transfers (None = built-in default).
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Optional local retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub backoff: Option<BackoffConfig>,
    #[serde(default)]
    pub extraction: Option<ExtractionConfig>,
    #[serde(default)]
    pub pacing: Option<PacingConfig>,
}

fn default_dir_name_len() -> usize {
    80
}

impl Default for CbmConfig {
    fn default() -> Self {
        Self {
            concurrency: 6,
            file_extension: "mp3".to_string(),
            max_stem_len: 60,
            max_dir_name_len: default_dir_name_len(),
            strict: false,
            user_agent: None,
            retry: None,
            backoff: None,
            extraction: None,
            pacing: None,
        }
    }
}

impl CbmConfig {
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn backoff_or_default(&self) -> BackoffConfig {
        self.backoff.clone().unwrap_or_default()
    }

    pub fn extraction_or_default(&self) -> ExtractionConfig {
        self.extraction.clone().unwrap_or_default()
    }

    pub fn pacing_or_default(&self) -> PacingConfig {
        self.pacing.clone().unwrap_or_default()
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Reject durations that are not finite non-negative seconds.
    pub fn validate(&self) -> Result<()> {
        let mut fields: Vec<(String, f64)> = Vec::new();
        if let Some(r) = &self.retry {
            fields.push(("retry.base_delay_secs".into(), r.base_delay_secs));
        }
        if let Some(b) = &self.backoff {
            for (i, s) in b.schedule_secs.iter().enumerate() {
                fields.push((format!("backoff.schedule_secs[{}]", i), *s));
            }
        }
        if let Some(e) = &self.extraction {
            fields.push(("extraction.observe_timeout_secs".into(), e.observe_timeout_secs));
        }
        if let Some(p) = &self.pacing {
            fields.push(("pacing.item_delay_secs".into(), p.item_delay_secs));
            fields.push(("pacing.batch_pause_secs".into(), p.batch_pause_secs));
        }
        for (name, value) in fields {
            anyhow::ensure!(
                value.is_finite() && value >= 0.0 && Duration::try_from_secs_f64(value).is_ok(),
                "{} must be a finite number of seconds >= 0, got {}",
                name,
                value
            );
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cbm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CbmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CbmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<CbmConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: CbmConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = CbmConfig::default();
        assert_eq!(cfg.concurrency, 6);
        assert_eq!(cfg.file_extension, "mp3");
        assert_eq!(cfg.max_stem_len, 60);
        assert!(!cfg.strict);
        assert_eq!(cfg.retry_or_default().max_attempts, 3);
        assert_eq!(
            cfg.backoff_or_default().schedule(),
            vec![
                Duration::from_secs(300),
                Duration::from_secs(600),
                Duration::from_secs(1200),
                Duration::from_secs(1800),
            ]
        );
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = CbmConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: CbmConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.concurrency, cfg.concurrency);
        assert_eq!(parsed.file_extension, cfg.file_extension);
        assert_eq!(parsed.max_dir_name_len, cfg.max_dir_name_len);
    }

    #[test]
    fn config_toml_sections() {
        let toml = r#"
            concurrency = 2
            file_extension = "m4a"
            max_stem_len = 40
            strict = true

            [retry]
            max_attempts = 5
            base_delay_secs = 0.5
            max_delay_secs = 10

            [backoff]
            schedule_secs = [1.0, 2.0]

            [pacing]
            batch_size = 100
            batch_pause_secs = 300
        "#;
        let cfg: CbmConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.concurrency, 2);
        assert!(cfg.strict);
        assert_eq!(cfg.max_dir_name_len, 80);
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 5);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
        let backoff = cfg.backoff_or_default();
        assert_eq!(backoff.schedule().len(), 2);
        assert!(backoff
            .rate_limit_signals
            .iter()
            .any(|s| s == "too many requests"));
        let pacing = cfg.pacing_or_default();
        assert_eq!(pacing.batch_size, 100);
        assert_eq!(pacing.item_delay(), Duration::ZERO);
        assert_eq!(cfg.pacing_or_default().batch_pause(), Duration::from_secs(300));
        assert!(cfg.extraction.is_none());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let toml = r#"
            concurrency = 6
            file_extension = "mp3"
            max_stem_len = 60
        "#;
        let cfg: CbmConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.user_agent(), DEFAULT_USER_AGENT);
        assert_eq!(
            cfg.extraction_or_default().observe_timeout(),
            Duration::from_secs(6)
        );
    }

    #[test]
    fn infinite_or_negative_seconds_are_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "concurrency = 2\nfile_extension = \"mp3\"\nmax_stem_len = 60\n\n[backoff]\nschedule_secs = [5.0, inf]\n",
        )
        .unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("backoff.schedule_secs[1]"));

        fs::write(
            &path,
            "concurrency = 2\nfile_extension = \"mp3\"\nmax_stem_len = 60\n\n[pacing]\nitem_delay_secs = -1.0\n",
        )
        .unwrap();
        assert!(load_from_path(&path).is_err());
    }

    #[test]
    fn duration_accessors_never_panic() {
        let backoff = BackoffConfig {
            schedule_secs: vec![f64::INFINITY, f64::NAN, -3.0, 1e300],
            ..BackoffConfig::default()
        };
        assert_eq!(
            backoff.schedule(),
            vec![Duration::MAX, Duration::ZERO, Duration::ZERO, Duration::MAX]
        );
    }
}
