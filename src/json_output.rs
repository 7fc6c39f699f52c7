//! JSON output format for sequence reports
//!
//! `--format json` implementation

use crate::orchestrator::RunReport;
use crate::sequence::Sequence;
use serde::{Deserialize, Serialize};

/// Summary of the run that produced the sequences
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonSummary {
    /// Attempts used, the successful one included
    pub attempts: u32,
    /// Lines in the fetched log
    pub lines_total: u64,
    /// Lines with too few fields
    pub lines_skipped: u64,
    /// Sequence observations (sum of all counts)
    pub sequences_emitted: u64,
    /// Distinct ordered triples
    pub distinct_sequences: u64,
}

impl From<&RunReport> for JsonSummary {
    fn from(report: &RunReport) -> Self {
        Self {
            attempts: report.attempts,
            lines_total: report.lines_total,
            lines_skipped: report.lines_skipped,
            sequences_emitted: report.sequences_emitted,
            distinct_sequences: report.distinct_sequences,
        }
    }
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// Where the log came from
    pub source: String,
    /// Run summary (absent when showing stored results)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<JsonSummary>,
    /// Sequences, highest count first
    pub sequences: Vec<Sequence>,
}

impl JsonOutput {
    /// Create a new JSON output structure
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "pathseq-json-v1".to_string(),
            source: source.into(),
            summary: None,
            sequences: Vec::new(),
        }
    }

    pub fn set_summary(&mut self, report: &RunReport) {
        self.summary = Some(JsonSummary::from(report));
    }

    pub fn set_sequences(&mut self, sequences: Vec<Sequence>) {
        self.sequences = sequences;
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
