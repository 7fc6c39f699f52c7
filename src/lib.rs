//! pathseq - navigation sequence counting for web access logs
//!
//! This library ingests a whitespace-delimited access log, follows each
//! client's requests through a three-path sliding window, counts every
//! distinct ordered triple of consecutive paths, persists the counts and
//! returns them sorted by frequency.
//!
//! Runs are orchestrated with bounded retry, staged commits that never expose
//! a half-built result set, and progress reporting from a background worker.

pub mod cli;
pub mod config;
pub mod csv_output;
pub mod json_output;
pub mod orchestrator;
pub mod sequence;
pub mod sink;
pub mod source;
pub mod store;
pub mod tokenizer;
pub mod worker;
