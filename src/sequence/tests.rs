// Scenario tests for navigation sequence mining
//
// Streaming (SequenceTracker) and offline (extract_sequences) extraction must
// agree on the same per-client histories.

use super::*;
use std::collections::HashMap;

fn feed(tracker: &mut SequenceTracker, events: &[(&str, &str)]) -> Vec<PathTriple> {
    events
        .iter()
        .filter_map(|(client, path)| tracker.observe(client, path))
        .collect()
}

/// History [A, B, C, D] for one client yields exactly (A,B,C) then (B,C,D)
#[test]
fn test_single_client_four_paths() {
    let mut tracker = SequenceTracker::new();
    let emitted = feed(
        &mut tracker,
        &[("1.1.1.1", "/a"), ("1.1.1.1", "/b"), ("1.1.1.1", "/c"), ("1.1.1.1", "/d")],
    );

    assert_eq!(
        emitted,
        vec![
            PathTriple::new("/a", "/b", "/c"),
            PathTriple::new("/b", "/c", "/d"),
        ]
    );
}

/// Interleaved clients never mix paths into each other's sequences
#[test]
fn test_interleaved_clients() {
    let mut tracker = SequenceTracker::new();
    let emitted = feed(
        &mut tracker,
        &[
            ("a", "/home"),
            ("b", "/login"),
            ("a", "/products"),
            ("b", "/account"),
            ("a", "/cart"),
            ("b", "/logout"),
        ],
    );

    assert_eq!(emitted.len(), 2);
    assert!(emitted.contains(&PathTriple::new("/home", "/products", "/cart")));
    assert!(emitted.contains(&PathTriple::new("/login", "/account", "/logout")));
}

/// Streaming extraction counts match offline extraction per client
#[test]
fn test_streaming_matches_offline() {
    let events = [
        ("x", "/1"),
        ("y", "/1"),
        ("x", "/2"),
        ("x", "/3"),
        ("y", "/2"),
        ("x", "/1"),
        ("y", "/3"),
        ("x", "/2"),
        ("x", "/3"),
    ];

    let mut tracker = SequenceTracker::new();
    let mut streamed: SequenceMap = HashMap::new();
    for triple in feed(&mut tracker, &events) {
        *streamed.entry(triple).or_insert(0) += 1;
    }

    let mut offline: SequenceMap = HashMap::new();
    for client in ["x", "y"] {
        let history: Vec<String> = events
            .iter()
            .filter(|(c, _)| *c == client)
            .map(|(_, p)| p.to_string())
            .collect();
        for (triple, count) in extract_sequences(&history) {
            *offline.entry(triple).or_insert(0) += count;
        }
    }

    assert_eq!(streamed, offline);
    assert_eq!(streamed.get(&PathTriple::new("/1", "/2", "/3")), Some(&3));
}

/// A client that revisits the same page produces self-loop sequences
#[test]
fn test_repeated_page_reload() {
    let mut tracker = SequenceTracker::new();
    let emitted = feed(&mut tracker, &[("k", "/x"), ("k", "/x"), ("k", "/x"), ("k", "/x")]);

    assert_eq!(emitted, vec![PathTriple::new("/x", "/x", "/x"); 2]);
}

/// Empty history
#[test]
fn test_empty_history() {
    let mut tracker = SequenceTracker::new();

    assert!(extract_sequences(&[]).is_empty());
    assert!(feed(&mut tracker, &[]).is_empty());
    assert_eq!(tracker.client_count(), 0);
}
