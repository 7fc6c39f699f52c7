//! Ingestion configuration
//!
//! Settings come from an optional `pathseq.toml` and are overridden by CLI
//! flags.
//!
//! # Example pathseq.toml
//!
//! ```toml
//! url = "https://logs.example.com/access.log"
//! database = "data/sequences.db"
//! commit_mode = "staged"
//! idle_horizon = 50000
//!
//! [retry]
//! max_attempts = 5
//! base_delay_ms = 250
//! max_delay_ms = 4000
//! ```

use crate::source::{FileLogSource, HttpLogSource, LogSource, DEFAULT_LOG_URL};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How a run replaces the previously committed sequences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitMode {
    /// Build the new counts in staging and swap them in on commit
    #[default]
    Staged,
    /// Purge the store before processing; a failed run leaves it empty
    PurgeFirst,
}

/// Bounded retry of whole ingestion runs
///
/// # Example
/// ```
/// use pathseq::config::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 5);
/// assert_eq!(policy.delay_for(1), Duration::from_millis(100));
/// assert_eq!(policy.delay_for(3), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per run, the first one included
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry
    pub base_delay_ms: u64,

    /// Upper bound on any single delay
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// Same attempt bound, no waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Backoff before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 || self.base_delay_ms == 0 {
            return Duration::ZERO;
        }
        let factor = 1u64.checked_shl(retry - 1).unwrap_or(u64::MAX);
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Complete ingestion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Remote log location (ignored when `file` is set)
    pub url: Option<String>,

    /// Local log file
    pub file: Option<PathBuf>,

    /// SQLite database for persisted counts; in-memory when unset
    pub database: Option<PathBuf>,

    pub commit_mode: CommitMode,

    pub retry: RetryPolicy,

    /// Drop client windows idle for this many lines (unset: never)
    pub idle_horizon: Option<u64>,

    /// Transport timeout for HTTP sources
    pub http_timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            url: None,
            file: None,
            database: None,
            commit_mode: CommitMode::Staged,
            retry: RetryPolicy::default(),
            idle_horizon: None,
            http_timeout_secs: 30,
        }
    }
}

impl IngestConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a run
    pub fn validate(&self) -> Result<()> {
        if self.url.is_some() && self.file.is_some() {
            anyhow::bail!("Cannot specify both url and file. Choose one.");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be >= 1");
        }
        Ok(())
    }

    /// Build the configured log source
    pub fn log_source(&self) -> Box<dyn LogSource> {
        match (&self.file, &self.url) {
            (Some(file), _) => Box::new(FileLogSource::new(file)),
            (None, Some(url)) => Box::new(HttpLogSource::new(url, self.http_timeout())),
            (None, None) => Box::new(HttpLogSource::new(DEFAULT_LOG_URL, self.http_timeout())),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.commit_mode, CommitMode::Staged);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.validate().is_ok());
        assert!(config.log_source().describe().contains("Apache.log"));
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            file = "logs/access.log"
            database = "seq.db"
            commit_mode = "purge-first"
            idle_horizon = 1000

            [retry]
            max_attempts = 3
            base_delay_ms = 0
        "#;

        let config = IngestConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.file, Some(PathBuf::from("logs/access.log")));
        assert_eq!(config.commit_mode, CommitMode::PurgeFirst);
        assert_eq!(config.idle_horizon, Some(1000));
        assert_eq!(config.retry.max_attempts, 3);
        // unspecified fields keep defaults
        assert_eq!(config.retry.max_delay_ms, 5_000);
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.log_source().describe(), "logs/access.log");
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = IngestConfig::from_toml_str("").unwrap();
        assert_eq!(config, IngestConfig::default());
    }

    #[test]
    fn test_url_and_file_conflict() {
        let toml = r#"
            url = "http://example.com/log"
            file = "access.log"
        "#;
        assert!(IngestConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let toml = "[retry]\nmax_attempts = 0\n";
        assert!(IngestConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 1_000,
            max_delay_ms: 3_000,
        };
        assert_eq!(policy.delay_for(0), Duration::ZERO);
        assert_eq!(policy.delay_for(2), Duration::from_millis(2_000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(3_000));
        assert_eq!(policy.delay_for(80), Duration::from_millis(3_000));
        assert_eq!(RetryPolicy::immediate(5).delay_for(4), Duration::ZERO);
    }
}
