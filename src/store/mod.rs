//! Persistent counting store for navigation sequences
//!
//! A store holds one record per ordered path triple with its occurrence count.
//! Uniqueness is enforced here, in the application layer, through
//! [`SequenceTable`]'s triple index; the persisted layout has no unique
//! constraint of its own.
//!
//! # Visible state and staging
//!
//! Every store distinguishes the *visible* state (what
//! [`SequenceStore::query_all_sorted_by_count_desc`] returns) from an optional
//! *staging* table:
//!
//! ```text
//! begin_staging()  ──►  purge / upsert go to staging, queries still see the
//!                       last committed state
//! commit()         ──►  staging atomically replaces the visible state
//! ```
//!
//! Without staging, `purge` is destructive: it clears the visible state (and
//! its persisted rows) immediately. That purge-first mode is kept as a
//! fallback; a run that fails between purge and commit leaves the store empty.

mod memory;
mod sqlite;
mod table;

pub use memory::MemorySequenceStore;
pub use sqlite::{RunLogEntry, SqliteSequenceStore};
pub use table::SequenceTable;

use crate::sequence::{PathTriple, Sequence};
use thiserror::Error;

/// Errors raised by store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Commit cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Line accounting for one ingestion run, recorded alongside its commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lines_total: u64,
    pub lines_skipped: u64,
    pub sequences_emitted: u64,
}

/// Counting store with purge, upsert, commit and a sorted query
pub trait SequenceStore: Send {
    /// Remove every record from the current target (staging if open)
    fn purge(&mut self) -> Result<()>;

    /// Increment the record for `triple`, creating it with count 1 if absent
    fn upsert(&mut self, triple: &PathTriple) -> Result<()>;

    /// Durably persist the current target
    ///
    /// With staging open, the staged records replace the visible state in one
    /// atomic step and staging closes. On failure, previously committed
    /// records are kept; records upserted since may be lost.
    fn commit(&mut self) -> Result<()> {
        self.commit_unless_cancelled(&|| false)
    }

    /// [`commit`](SequenceStore::commit) that backs out with
    /// [`StoreError::Cancelled`] if `cancelled` reports true before the swap
    /// becomes durable
    ///
    /// A cancelled commit leaves the visible state and staging untouched.
    fn commit_unless_cancelled(&mut self, cancelled: &dyn Fn() -> bool) -> Result<()>;

    /// Every visible record, highest count first
    ///
    /// Ties keep first-insertion order.
    fn query_all_sorted_by_count_desc(&self) -> Result<Vec<Sequence>>;

    /// Open an empty staging table; further writes leave the visible state alone
    fn begin_staging(&mut self) -> Result<()>;

    /// Drop the staging table without touching the visible state
    fn abort_staging(&mut self);

    fn is_staging(&self) -> bool;

    /// Attach run accounting to the next commit
    fn note_run(&mut self, _summary: RunSummary) {}
}

impl<S: SequenceStore + ?Sized> SequenceStore for Box<S> {
    fn purge(&mut self) -> Result<()> {
        (**self).purge()
    }

    fn upsert(&mut self, triple: &PathTriple) -> Result<()> {
        (**self).upsert(triple)
    }

    fn commit_unless_cancelled(&mut self, cancelled: &dyn Fn() -> bool) -> Result<()> {
        (**self).commit_unless_cancelled(cancelled)
    }

    fn query_all_sorted_by_count_desc(&self) -> Result<Vec<Sequence>> {
        (**self).query_all_sorted_by_count_desc()
    }

    fn begin_staging(&mut self) -> Result<()> {
        (**self).begin_staging()
    }

    fn abort_staging(&mut self) {
        (**self).abort_staging()
    }

    fn is_staging(&self) -> bool {
        (**self).is_staging()
    }

    fn note_run(&mut self, summary: RunSummary) {
        (**self).note_run(summary)
    }
}
