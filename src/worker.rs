//! Background ingestion worker
//!
//! Runs execute on a dedicated thread so fetching and line processing never
//! block the caller. At most one run is in flight per [`RunGuard`]: the store's
//! purge/rebuild cycle is not safe under concurrent writers.
//!
//! ```text
//! caller thread                         worker thread
//! ─────────────                         ─────────────
//! IngestWorker::spawn ── acquire guard ─► Orchestrator::run
//!        │                                  │ on_progress / on_results
//!        ▼                                  ▼
//! Receiver<IngestEvent> ◄──── crossbeam channel ────
//! IngestHandle::join  ◄──── (RunOutcome, Orchestrator) ── guard released
//! ```

use crate::orchestrator::{CancelToken, IngestError, Orchestrator, RunOutcome};
use crate::sink::{ChannelSink, IngestEvent, ProgressSink, ResultSink};
use crate::source::LogSource;
use crate::store::SequenceStore;
use crossbeam::channel::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Single-flight flag shared by everything that may start a run
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn acquire(&self) -> Result<RunPermit, IngestError> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| IngestError::AlreadyRunning)?;
        Ok(RunPermit {
            running: self.running.clone(),
        })
    }
}

/// Releases the guard on drop, also while unwinding from a panic
struct RunPermit {
    running: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Spawns ingestion runs on a dedicated thread
#[derive(Debug, Clone, Default)]
pub struct IngestWorker {
    guard: RunGuard,
}

impl IngestWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Worker sharing an existing guard
    pub fn with_guard(guard: RunGuard) -> Self {
        Self { guard }
    }

    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Start a run in the background
    ///
    /// Fails with [`IngestError::AlreadyRunning`] while another run holding the
    /// same guard is in flight.
    pub fn spawn<L, S, P, R>(
        &self,
        mut orchestrator: Orchestrator<L, S>,
        mut progress: P,
        mut results: R,
    ) -> Result<IngestHandle<L, S>, IngestError>
    where
        L: LogSource + 'static,
        S: SequenceStore + 'static,
        P: ProgressSink + Send + 'static,
        R: ResultSink + Send + 'static,
    {
        let permit = self.guard.acquire()?;
        let cancel = orchestrator.cancel_token();

        let handle = thread::Builder::new()
            .name("pathseq-ingest".to_string())
            .spawn(move || {
                let _permit = permit;
                let outcome = orchestrator.run(&mut progress, &mut results);
                (outcome, orchestrator)
            })
            .map_err(IngestError::Spawn)?;

        Ok(IngestHandle { handle, cancel })
    }

    /// Start a run whose notifications arrive as [`IngestEvent`]s
    pub fn spawn_with_channel<L, S>(
        &self,
        orchestrator: Orchestrator<L, S>,
    ) -> Result<(IngestHandle<L, S>, Receiver<IngestEvent>), IngestError>
    where
        L: LogSource + 'static,
        S: SequenceStore + 'static,
    {
        let (sink, events) = ChannelSink::new();
        let handle = self.spawn(orchestrator, sink.clone(), sink)?;
        Ok((handle, events))
    }
}

/// Handle to a run in flight
pub struct IngestHandle<L, S> {
    handle: JoinHandle<(RunOutcome, Orchestrator<L, S>)>,
    cancel: CancelToken,
}

impl<L, S> IngestHandle<L, S> {
    /// Request cancellation; a run not yet committing will not commit
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run; returns its outcome and the orchestrator for reuse
    pub fn join(self) -> Result<(RunOutcome, Orchestrator<L, S>), IngestError> {
        self.handle.join().map_err(|_| IngestError::WorkerPanicked)
    }
}
