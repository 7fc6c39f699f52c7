//! End-to-end ingestion run: fetch, stage, process, commit, query, publish
//!
//! # State machine
//!
//! ```text
//! Idle → Fetching → Staging → Processing → Committing → Querying → Publishing → Done
//!           │                     │             │            │
//!           └──── failure ────────┴─────────────┴────────────┴──► Retrying → Fetching
//!                                                                    │
//!                                                  attempts exhausted └──► Failed
//! ```
//!
//! Every attempt starts over from the fetch; there is no partial resumption.
//! An attempt that completes without a single sequence counts as failed.
//! Lines with too few fields are skipped and never fail an attempt.

use crate::config::{CommitMode, IngestConfig, RetryPolicy};
use crate::sequence::{Sequence, SequenceTracker};
use crate::sink::{ProgressSink, ResultSink};
use crate::source::{FetchError, LogSource};
use crate::store::{RunSummary, SequenceStore, StoreError};
use crate::tokenizer::tokenize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Errors that end an ingestion attempt or a run
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),

    #[error("run produced no sequences")]
    EmptyResult,

    #[error("cancelled")]
    Cancelled,

    #[error("an ingestion run is already in flight")]
    AlreadyRunning,

    #[error("ingestion worker panicked")]
    WorkerPanicked,

    #[error("failed to spawn ingestion worker: {0}")]
    Spawn(std::io::Error),
}

/// Observable phase of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Staging,
    Processing,
    Committing,
    Querying,
    Publishing,
    Retrying,
    Done,
    Failed,
}

/// Accounting for a whole run (all attempts)
///
/// Line counters describe the last attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub attempts: u32,
    pub retries: u32,
    pub lines_total: u64,
    pub lines_skipped: u64,
    pub sequences_emitted: u64,
    pub distinct_sequences: u64,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Results were committed and delivered to the result sink
    Published(RunReport),
    /// The result sink received a single failure notification
    Failed { reason: String, report: RunReport },
}

impl RunOutcome {
    pub fn report(&self) -> &RunReport {
        match self {
            RunOutcome::Published(report) => report,
            RunOutcome::Failed { report, .. } => report,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, RunOutcome::Published(_))
    }
}

/// Shared cancellation flag
///
/// Checked before each attempt, before each line, and by the store right
/// before its commit becomes durable. A run cancelled before then never
/// commits; a cancel seen after the commit suppresses publication. Either way
/// the run is not retried.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the owner can run again
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives ingestion runs for one log source into one store
pub struct Orchestrator<L, S> {
    source: L,
    store: S,
    retry: RetryPolicy,
    commit_mode: CommitMode,
    idle_horizon: Option<u64>,
    cancel: CancelToken,
    state: RunState,
}

impl<L: LogSource, S: SequenceStore> Orchestrator<L, S> {
    /// Orchestrator with default retry policy and staged commits
    pub fn new(source: L, store: S) -> Self {
        Self {
            source,
            store,
            retry: RetryPolicy::default(),
            commit_mode: CommitMode::default(),
            idle_horizon: None,
            cancel: CancelToken::new(),
            state: RunState::Idle,
        }
    }

    /// Orchestrator using the policy fields of `config`
    pub fn from_config(source: L, store: S, config: &IngestConfig) -> Self {
        Self::new(source, store)
            .with_retry_policy(config.retry)
            .with_commit_mode(config.commit_mode)
            .with_idle_horizon(config.idle_horizon)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_commit_mode(mut self, commit_mode: CommitMode) -> Self {
        self.commit_mode = commit_mode;
        self
    }

    pub fn with_idle_horizon(mut self, idle_horizon: Option<u64>) -> Self {
        self.idle_horizon = idle_horizon;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn source(&self) -> &L {
        &self.source
    }

    pub fn into_parts(self) -> (L, S) {
        (self.source, self.store)
    }

    /// Execute one run with bounded retry
    ///
    /// Exactly one of `results.on_results` / `results.on_failure` is called.
    pub fn run<P, R>(&mut self, progress: &mut P, results: &mut R) -> RunOutcome
    where
        P: ProgressSink + ?Sized,
        R: ResultSink + ?Sized,
    {
        let span = tracing::info_span!("ingest", source = %self.source.describe());
        let _enter = span.enter();

        let mut report = RunReport::default();
        let mut failures: u32 = 0;

        loop {
            report.attempts += 1;
            report.retries = report.attempts - 1;

            let err = match self.attempt(progress, &mut report) {
                Ok(sequences) => {
                    self.transition(RunState::Publishing);
                    results.on_results(&sequences);
                    self.transition(RunState::Done);
                    tracing::info!(
                        attempts = report.attempts,
                        lines = report.lines_total,
                        skipped = report.lines_skipped,
                        distinct = report.distinct_sequences,
                        "published sequences"
                    );
                    return RunOutcome::Published(report);
                }
                Err(err) => err,
            };

            self.store.abort_staging();

            if matches!(err, IngestError::Cancelled) {
                return self.fail(results, report, "cancelled".to_string());
            }

            failures += 1;
            tracing::warn!(attempt = report.attempts, error = %err, "ingestion attempt failed");

            if failures >= self.retry.max_attempts {
                let reason = format!("giving up after {} attempts: {}", report.attempts, err);
                return self.fail(results, report, reason);
            }

            self.transition(RunState::Retrying);
            if self.wait_before_retry(self.retry.delay_for(failures)) {
                return self.fail(results, report, "cancelled".to_string());
            }
        }
    }

    fn attempt<P>(
        &mut self,
        progress: &mut P,
        report: &mut RunReport,
    ) -> Result<Vec<Sequence>, IngestError>
    where
        P: ProgressSink + ?Sized,
    {
        self.check_cancelled()?;

        self.transition(RunState::Fetching);
        let lines = self.source.fetch()?;

        self.transition(RunState::Staging);
        match self.commit_mode {
            CommitMode::Staged => {
                self.store.begin_staging()?;
                self.store.purge()?;
            }
            CommitMode::PurgeFirst => self.store.purge()?,
        }

        self.transition(RunState::Processing);
        let summary = self.process(&lines, progress)?;
        report.lines_total = summary.lines_total;
        report.lines_skipped = summary.lines_skipped;
        report.sequences_emitted = summary.sequences_emitted;
        report.distinct_sequences = 0;

        // an empty run never replaces committed data
        if summary.sequences_emitted == 0 {
            return Err(IngestError::EmptyResult);
        }

        self.check_cancelled()?;
        self.transition(RunState::Committing);
        self.store.note_run(summary);
        let cancel = self.cancel.clone();
        match self.store.commit_unless_cancelled(&|| cancel.is_cancelled()) {
            Err(StoreError::Cancelled) => return Err(IngestError::Cancelled),
            committed => committed?,
        }
        // a cancel that raced the final check still suppresses publication
        self.check_cancelled()?;

        self.transition(RunState::Querying);
        let sequences = self.store.query_all_sorted_by_count_desc()?;
        if sequences.is_empty() {
            return Err(IngestError::EmptyResult);
        }
        report.distinct_sequences = sequences.len() as u64;

        Ok(sequences)
    }

    fn process<P>(
        &mut self,
        lines: &[String],
        progress: &mut P,
    ) -> Result<RunSummary, IngestError>
    where
        P: ProgressSink + ?Sized,
    {
        let total = lines.len() as u64;
        let mut tracker = match self.idle_horizon {
            Some(horizon) => SequenceTracker::with_idle_horizon(horizon),
            None => SequenceTracker::new(),
        };
        let mut summary = RunSummary {
            lines_total: total,
            ..RunSummary::default()
        };

        for (i, line) in lines.iter().enumerate() {
            self.check_cancelled()?;

            match tokenize(line) {
                Some(token) => {
                    if let Some(triple) = tracker.observe(token.client, token.path) {
                        self.store.upsert(&triple)?;
                        summary.sequences_emitted += 1;
                    }
                }
                None => {
                    summary.lines_skipped += 1;
                    tracing::trace!(line = i + 1, "skipping line with too few fields");
                }
            }

            progress.on_progress(i as u64 + 1, total);
        }

        tracing::debug!(
            lines = total,
            skipped = summary.lines_skipped,
            emitted = summary.sequences_emitted,
            clients = tracker.client_count(),
            "processed log"
        );
        Ok(summary)
    }

    fn fail<R>(&mut self, results: &mut R, report: RunReport, reason: String) -> RunOutcome
    where
        R: ResultSink + ?Sized,
    {
        self.transition(RunState::Failed);
        tracing::warn!(attempts = report.attempts, %reason, "ingestion failed");
        results.on_failure(&reason);
        RunOutcome::Failed { reason, report }
    }

    /// Sleep before the next attempt; returns true if cancelled meanwhile
    fn wait_before_retry(&self, delay: Duration) -> bool {
        const SLICE: Duration = Duration::from_millis(50);

        let mut remaining = delay;
        while !remaining.is_zero() {
            if self.cancel.is_cancelled() {
                return true;
            }
            let step = remaining.min(SLICE);
            thread::sleep(step);
            remaining -= step;
        }
        self.cancel.is_cancelled()
    }

    fn check_cancelled(&self) -> Result<(), IngestError> {
        if self.cancel.is_cancelled() {
            Err(IngestError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }
}
