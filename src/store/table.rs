use crate::sequence::{PathTriple, Sequence};
use std::collections::HashMap;

/// In-memory counting table keyed by ordered path triple
///
/// Rows are kept in first-insertion order next to a `triple -> row` index,
/// giving O(1) amortized upserts and a deterministic tie-break for the sorted
/// query: equal counts keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceTable {
    rows: Vec<Sequence>,
    index: HashMap<PathTriple, usize>,
}

impl SequenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every record
    pub fn purge(&mut self) {
        self.rows.clear();
        self.index.clear();
    }

    /// Increment the record for `triple`, inserting it with count 1 if absent
    ///
    /// Returns the record's count after the upsert.
    pub fn upsert(&mut self, triple: &PathTriple) -> u64 {
        if let Some(&row) = self.index.get(triple) {
            self.rows[row].count += 1;
            return self.rows[row].count;
        }

        self.index.insert(triple.clone(), self.rows.len());
        self.rows.push(Sequence::new(triple.clone(), 1));
        1
    }

    /// Insert a record with an explicit count, merging into an existing row
    ///
    /// Used when loading persisted rows, which carry no uniqueness constraint
    /// of their own.
    pub fn insert_counted(&mut self, sequence: Sequence) {
        if sequence.count == 0 {
            return;
        }
        let triple = sequence.triple();
        match self.index.get(&triple) {
            Some(&row) => self.rows[row].count += sequence.count,
            None => {
                self.index.insert(triple, self.rows.len());
                self.rows.push(sequence);
            }
        }
    }

    pub fn get(&self, triple: &PathTriple) -> Option<u64> {
        self.index.get(triple).map(|&row| self.rows[row].count)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|s| s.count).sum()
    }

    /// Records in insertion order
    pub fn rows(&self) -> &[Sequence] {
        &self.rows
    }

    /// All records ordered by count, highest first; ties keep insertion order
    pub fn sorted_desc(&self) -> Vec<Sequence> {
        let mut sorted = self.rows.clone();
        // stable sort preserves insertion order among equal counts
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        sorted
    }
}
