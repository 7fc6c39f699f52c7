//! Progress and result notifications leaving an ingestion run
//!
//! Runs execute on a worker thread; the caller receives notifications either
//! through its own [`ProgressSink`]/[`ResultSink`] implementations or as
//! [`IngestEvent`] messages over a `crossbeam` channel via [`ChannelSink`].
//! The worker never touches caller state directly.

use crate::sequence::Sequence;
use crossbeam::channel::{self, Receiver, Sender};

/// Receives per-line progress during processing
pub trait ProgressSink {
    /// Called after each processed line with `(processed, total)`
    fn on_progress(&mut self, processed: u64, total: u64);
}

/// Receives the outcome of a run
pub trait ResultSink {
    /// Complete, committed, non-empty result set, highest count first
    fn on_results(&mut self, sequences: &[Sequence]);

    /// Terminal failure after retries are exhausted or the run was cancelled
    fn on_failure(&mut self, reason: &str);
}

impl<F: FnMut(u64, u64)> ProgressSink for F {
    fn on_progress(&mut self, processed: u64, total: u64) {
        self(processed, total)
    }
}

/// Notification crossing the worker boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    Progress { processed: u64, total: u64 },
    Results(Vec<Sequence>),
    Failure(String),
}

/// Forwards every notification as an [`IngestEvent`] on a channel
///
/// Sends never block; if the receiver is gone the event is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<IngestEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its unbounded channel
    pub fn new() -> (Self, Receiver<IngestEvent>) {
        let (tx, rx) = channel::unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, event: IngestEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }
}

impl ProgressSink for ChannelSink {
    fn on_progress(&mut self, processed: u64, total: u64) {
        self.send(IngestEvent::Progress { processed, total });
    }
}

impl ResultSink for ChannelSink {
    fn on_results(&mut self, sequences: &[Sequence]) {
        self.send(IngestEvent::Results(sequences.to_vec()));
    }

    fn on_failure(&mut self, reason: &str) {
        self.send(IngestEvent::Failure(reason.to_string()));
    }
}

/// Keeps every notification in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub progress: Vec<(u64, u64)>,
    pub results: Vec<Vec<Sequence>>,
    pub failures: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&mut self, processed: u64, total: u64) {
        self.progress.push((processed, total));
    }
}

impl ResultSink for RecordingSink {
    fn on_results(&mut self, sequences: &[Sequence]) {
        self.results.push(sequences.to_vec());
    }

    fn on_failure(&mut self, reason: &str) {
        self.failures.push(reason.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::PathTriple;

    #[test]
    fn test_channel_sink_forwards_events() {
        let (mut sink, rx) = ChannelSink::new();
        sink.on_progress(1, 2);
        sink.on_results(&[Sequence::new(PathTriple::new("/a", "/b", "/c"), 1)]);
        sink.on_failure("boom");

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            IngestEvent::Progress {
                processed: 1,
                total: 2
            }
        );
        assert!(matches!(&events[1], IngestEvent::Results(r) if r.len() == 1));
        assert_eq!(events[2], IngestEvent::Failure("boom".to_string()));
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        sink.on_progress(1, 1);
        sink.on_failure("nobody listening");
    }

    #[test]
    fn test_closure_progress_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: u64, t: u64| seen.push((p, t));
            sink.on_progress(3, 4);
        }
        assert_eq!(seen, vec![(3, 4)]);
    }
}
