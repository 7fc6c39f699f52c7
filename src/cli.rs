//! CLI argument parsing for pathseq

use crate::config::{CommitMode, IngestConfig};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for sequence reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "pathseq")]
#[command(version)]
#[command(about = "Count three-page navigation sequences in web access logs", long_about = None)]
pub struct Cli {
    /// Fetch the access log from this URL
    #[arg(short = 'u', long = "url", value_name = "URL", conflicts_with = "file")]
    pub url: Option<String>,

    /// Read the access log from a local file
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// SQLite database for persisted counts (in-memory if omitted)
    #[arg(long = "db", value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Load settings from a TOML file; flags override it
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Only print the N most frequent sequences
    #[arg(short = 'n', long = "top", value_name = "N")]
    pub top: Option<usize>,

    /// Purge stored counts before processing instead of staging the new ones
    #[arg(long = "purge-first")]
    pub purge_first: bool,

    /// Attempts per run before giving up (default: 5)
    #[arg(long = "max-attempts", value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Base delay between attempts in milliseconds (default: 100)
    #[arg(long = "retry-delay-ms", value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    /// Forget clients idle for this many lines
    #[arg(long = "idle-horizon", value_name = "LINES")]
    pub idle_horizon: Option<u64>,

    /// HTTP timeout in seconds (default: 30)
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Print the stored sequences and the last run without ingesting (needs a database)
    #[arg(long = "show")]
    pub show: bool,

    /// Report progress on stderr
    #[arg(long = "progress")]
    pub progress: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Resolve the effective configuration: config file first, then flags
    pub fn to_config(&self) -> Result<IngestConfig> {
        let mut config = match &self.config {
            Some(path) => IngestConfig::from_file(path)?,
            None => IngestConfig::default(),
        };

        if let Some(url) = &self.url {
            config.url = Some(url.clone());
            config.file = None;
        }
        if let Some(file) = &self.file {
            config.file = Some(file.clone());
            config.url = None;
        }
        if let Some(database) = &self.database {
            config.database = Some(database.clone());
        }
        if self.purge_first {
            config.commit_mode = CommitMode::PurgeFirst;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(delay) = self.retry_delay_ms {
            config.retry.base_delay_ms = delay;
        }
        if let Some(horizon) = self.idle_horizon {
            config.idle_horizon = Some(horizon);
        }
        if let Some(timeout) = self.timeout_secs {
            config.http_timeout_secs = timeout;
        }

        config.validate()?;
        Ok(config)
    }
}
