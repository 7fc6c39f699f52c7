// Navigation sequence mining for access logs
//
// A navigation sequence is an ordered triple of request paths visited
// consecutively by one client. Sequences overlap with stride 1: a client
// history A, B, C, D contributes (A, B, C) and (B, C, D).
//
// Two entry points share the same types:
// - SequenceTracker: streaming, one observation at a time, per-client windows
// - extract_sequences: offline, over an already collected history

mod ngram;
mod tracker;

pub use ngram::{extract_sequences, PathTriple, Sequence, SequenceMap};
pub use tracker::{SequenceTracker, WINDOW_LEN};

#[cfg(test)]
mod tests;
