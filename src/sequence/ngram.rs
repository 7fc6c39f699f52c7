use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Ordered triple of request paths visited consecutively by one client
///
/// Identity is the ordered triple: `(A, B, C)` and `(C, B, A)` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathTriple {
    pub path_1: String,
    pub path_2: String,
    pub path_3: String,
}

impl PathTriple {
    pub fn new(
        path_1: impl Into<String>,
        path_2: impl Into<String>,
        path_3: impl Into<String>,
    ) -> Self {
        Self {
            path_1: path_1.into(),
            path_2: path_2.into(),
            path_3: path_3.into(),
        }
    }
}

impl fmt::Display for PathTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} -> {}", self.path_1, self.path_2, self.path_3)
    }
}

/// A counted sequence record, as persisted and published
///
/// Field names match the persisted columns (`path_1`, `path_2`, `path_3`, `count`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub path_1: String,
    pub path_2: String,
    pub path_3: String,
    pub count: u64,
}

impl Sequence {
    pub fn new(triple: PathTriple, count: u64) -> Self {
        Self {
            path_1: triple.path_1,
            path_2: triple.path_2,
            path_3: triple.path_3,
            count,
        }
    }

    /// The identifying triple of this record
    pub fn triple(&self) -> PathTriple {
        PathTriple::new(&self.path_1, &self.path_2, &self.path_3)
    }
}

/// Type alias for a trigram frequency map
pub type SequenceMap = HashMap<PathTriple, u64>;

/// Extracts overlapping path trigrams from one client's ordered path history
///
/// For example:
/// - Input history: ["/a", "/b", "/c", "/d"]
/// - Output trigrams: (/a, /b, /c) and (/b, /c, /d)
///
/// This is the offline counterpart of [`super::SequenceTracker`], useful when a
/// full per-client history is already in hand.
///
/// # Example
/// ```
/// use pathseq::sequence::{extract_sequences, PathTriple};
///
/// let history = vec!["/a".to_string(), "/b".to_string(), "/c".to_string()];
/// let sequences = extract_sequences(&history);
///
/// assert_eq!(sequences.len(), 1);
/// assert_eq!(sequences.get(&PathTriple::new("/a", "/b", "/c")), Some(&1));
/// ```
pub fn extract_sequences(paths: &[String]) -> SequenceMap {
    let mut sequences: SequenceMap = HashMap::new();

    for window in paths.windows(3) {
        let triple = PathTriple::new(&window[0], &window[1], &window[2]);
        *sequences.entry(triple).or_insert(0) += 1;
    }

    sequences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_extract_sequences_basic() {
        let sequences = extract_sequences(&history(&["/a", "/b", "/c", "/d"]));

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences.get(&PathTriple::new("/a", "/b", "/c")), Some(&1));
        assert_eq!(sequences.get(&PathTriple::new("/b", "/c", "/d")), Some(&1));
    }

    #[test]
    fn test_extract_sequences_repeated() {
        let sequences = extract_sequences(&history(&["/a", "/b", "/c", "/a", "/b", "/c"]));

        assert_eq!(sequences.get(&PathTriple::new("/a", "/b", "/c")), Some(&2));
        assert_eq!(sequences.get(&PathTriple::new("/b", "/c", "/a")), Some(&1));
        assert_eq!(sequences.get(&PathTriple::new("/c", "/a", "/b")), Some(&1));
    }

    #[test]
    fn test_extract_sequences_insufficient_length() {
        let sequences = extract_sequences(&history(&["/a", "/b"]));
        assert!(sequences.is_empty());
    }

    #[test]
    fn test_order_is_identity() {
        assert_ne!(
            PathTriple::new("/a", "/b", "/c"),
            PathTriple::new("/c", "/b", "/a")
        );
    }

    #[test]
    fn test_display_triple() {
        let triple = PathTriple::new("/a", "/b", "/c");
        assert_eq!(triple.to_string(), "/a -> /b -> /c");
    }
}
