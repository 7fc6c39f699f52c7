use super::{Result, RunSummary, SequenceStore, SequenceTable, StoreError};
use crate::sequence::{PathTriple, Sequence};

/// Process-local store; `commit` snapshots the visible table
///
/// Used when no database is configured and as the reference backend in tests.
#[derive(Debug, Default)]
pub struct MemorySequenceStore {
    visible: SequenceTable,
    committed: SequenceTable,
    staging: Option<SequenceTable>,
    pending_run: Option<RunSummary>,
    last_run: Option<RunSummary>,
    commits: u64,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// State as of the last successful commit
    pub fn committed(&self) -> &SequenceTable {
        &self.committed
    }

    /// Run accounting recorded by the last successful commit
    pub fn last_run(&self) -> Option<RunSummary> {
        self.last_run
    }

    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    fn target(&mut self) -> &mut SequenceTable {
        self.staging.as_mut().unwrap_or(&mut self.visible)
    }
}

impl SequenceStore for MemorySequenceStore {
    fn purge(&mut self) -> Result<()> {
        self.target().purge();
        Ok(())
    }

    fn upsert(&mut self, triple: &PathTriple) -> Result<()> {
        self.target().upsert(triple);
        Ok(())
    }

    fn commit_unless_cancelled(&mut self, cancelled: &dyn Fn() -> bool) -> Result<()> {
        if cancelled() {
            return Err(StoreError::Cancelled);
        }
        if let Some(staged) = self.staging.take() {
            self.visible = staged;
        }
        self.committed = self.visible.clone();
        self.last_run = self.pending_run.take().or(self.last_run);
        self.commits += 1;
        Ok(())
    }

    fn query_all_sorted_by_count_desc(&self) -> Result<Vec<Sequence>> {
        Ok(self.visible.sorted_desc())
    }

    fn begin_staging(&mut self) -> Result<()> {
        self.staging = Some(SequenceTable::new());
        Ok(())
    }

    fn abort_staging(&mut self) {
        self.staging = None;
        self.pending_run = None;
    }

    fn is_staging(&self) -> bool {
        self.staging.is_some()
    }

    fn note_run(&mut self, summary: RunSummary) {
        self.pending_run = Some(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> PathTriple {
        PathTriple::new("/a", "/b", "/c")
    }

    #[test]
    fn test_purge_then_query_is_empty() {
        let mut store = MemorySequenceStore::new();
        store.upsert(&abc()).unwrap();
        store.commit().unwrap();
        store.purge().unwrap();
        assert!(store.query_all_sorted_by_count_desc().unwrap().is_empty());
    }

    #[test]
    fn test_upsert_n_times_single_record() {
        let mut store = MemorySequenceStore::new();
        for _ in 0..4 {
            store.upsert(&abc()).unwrap();
        }
        let rows = store.query_all_sorted_by_count_desc().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 4);
    }

    #[test]
    fn test_staging_hides_writes_until_commit() {
        let mut store = MemorySequenceStore::new();
        store.upsert(&abc()).unwrap();
        store.commit().unwrap();

        store.begin_staging().unwrap();
        store.purge().unwrap();
        store.upsert(&PathTriple::new("/x", "/y", "/z")).unwrap();

        let visible = store.query_all_sorted_by_count_desc().unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].triple(), abc());

        store.commit().unwrap();
        let visible = store.query_all_sorted_by_count_desc().unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].path_1, "/x");
        assert!(!store.is_staging());
    }

    #[test]
    fn test_abort_staging_keeps_visible_state() {
        let mut store = MemorySequenceStore::new();
        store.upsert(&abc()).unwrap();
        store.commit().unwrap();

        store.begin_staging().unwrap();
        store.upsert(&PathTriple::new("/x", "/y", "/z")).unwrap();
        store.abort_staging();

        assert_eq!(store.committed().get(&abc()), Some(1));
        assert_eq!(store.query_all_sorted_by_count_desc().unwrap().len(), 1);
    }

    #[test]
    fn test_cancelled_commit_keeps_staging_and_visible_state() {
        let mut store = MemorySequenceStore::new();
        store.upsert(&abc()).unwrap();
        store.commit().unwrap();

        store.begin_staging().unwrap();
        store.upsert(&PathTriple::new("/x", "/y", "/z")).unwrap();
        let err = store.commit_unless_cancelled(&|| true).unwrap_err();

        assert!(matches!(err, StoreError::Cancelled));
        assert!(store.is_staging());
        assert_eq!(store.commit_count(), 1);
        assert_eq!(store.query_all_sorted_by_count_desc().unwrap()[0].triple(), abc());
    }

    #[test]
    fn test_commit_records_run_summary() {
        let mut store = MemorySequenceStore::new();
        let summary = RunSummary {
            lines_total: 10,
            lines_skipped: 1,
            sequences_emitted: 5,
        };
        store.note_run(summary);
        store.commit().unwrap();
        assert_eq!(store.last_run(), Some(summary));
        assert_eq!(store.commit_count(), 1);
    }
}
