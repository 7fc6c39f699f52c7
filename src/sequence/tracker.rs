use super::ngram::PathTriple;
use std::collections::{HashMap, VecDeque};

/// Number of paths in a navigation sequence
pub const WINDOW_LEN: usize = 3;

#[derive(Debug, Default)]
struct ClientWindow {
    paths: VecDeque<String>,
    last_seen: u64,
}

/// Per-client sliding window over request paths
///
/// Each client key owns a window of up to three paths. Every time a window
/// fills, the completed triple is emitted and the window slides left by one,
/// so a client with history [A, B, C, D] yields (A, B, C) then (B, C, D).
///
/// State lives for one ingestion run only. Windows are never shared between
/// clients and observations must be fed in log order.
///
/// # Example
/// ```
/// use pathseq::sequence::{PathTriple, SequenceTracker};
///
/// let mut tracker = SequenceTracker::new();
/// assert_eq!(tracker.observe("1.1.1.1", "/a"), None);
/// assert_eq!(tracker.observe("1.1.1.1", "/b"), None);
/// assert_eq!(
///     tracker.observe("1.1.1.1", "/c"),
///     Some(PathTriple::new("/a", "/b", "/c"))
/// );
/// ```
#[derive(Debug, Default)]
pub struct SequenceTracker {
    windows: HashMap<String, ClientWindow>,
    observations: u64,
    idle_horizon: Option<u64>,
}

impl SequenceTracker {
    /// Tracker with no eviction: memory scales with distinct clients in the run
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker that drops windows idle for more than `horizon` observations
    ///
    /// Eviction sweeps run once every `horizon` observations. An evicted
    /// client starts over with an empty window, so partial sequences spanning
    /// the idle gap are not counted. A horizon of 0 disables eviction.
    pub fn with_idle_horizon(horizon: u64) -> Self {
        Self {
            idle_horizon: (horizon > 0).then_some(horizon),
            ..Self::default()
        }
    }

    /// Feed one (client, path) observation; returns the triple completed by it
    pub fn observe(&mut self, client: &str, path: &str) -> Option<PathTriple> {
        self.observations += 1;
        let now = self.observations;

        let window = self.windows.entry(client.to_owned()).or_default();
        window.last_seen = now;
        window.paths.push_back(path.to_string());

        let emitted = if window.paths.len() == WINDOW_LEN {
            let candidate = PathTriple::new(
                window.paths[0].clone(),
                window.paths[1].clone(),
                window.paths[2].clone(),
            );
            window.paths.pop_front();
            Some(candidate)
        } else {
            None
        };

        if let Some(horizon) = self.idle_horizon {
            if now % horizon == 0 {
                self.evict_idle(now, horizon);
            }
        }

        emitted
    }

    fn evict_idle(&mut self, now: u64, horizon: u64) {
        let before = self.windows.len();
        self.windows.retain(|_, window| now - window.last_seen < horizon);
        let evicted = before - self.windows.len();
        if evicted > 0 {
            tracing::trace!(evicted, remaining = self.windows.len(), "evicted idle client windows");
        }
    }

    /// Number of clients with a live window
    pub fn client_count(&self) -> usize {
        self.windows.len()
    }

    /// Total observations fed since creation or the last reset
    pub fn observations(&self) -> u64 {
        self.observations
    }

    /// Current window contents for a client, oldest first
    pub fn window(&self, client: &str) -> Option<Vec<&str>> {
        self.windows
            .get(client)
            .map(|w| w.paths.iter().map(String::as_str).collect())
    }

    /// Discard every window
    pub fn reset(&mut self) {
        self.windows.clear();
        self.observations = 0;
    }
}
