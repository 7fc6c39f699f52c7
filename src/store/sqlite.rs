use super::{Result, RunSummary, SequenceStore, SequenceTable, StoreError};
use crate::sequence::{PathTriple, Sequence};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Busy timeout for the store connection
const BUSY_TIMEOUT_SECS: u64 = 5;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS sequences (
        path_1 TEXT NOT NULL,
        path_2 TEXT NOT NULL,
        path_3 TEXT NOT NULL,
        count  INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS run_log (
        id                 INTEGER PRIMARY KEY AUTOINCREMENT,
        committed_at       TEXT NOT NULL,
        lines_total        INTEGER NOT NULL,
        lines_skipped      INTEGER NOT NULL,
        sequences_emitted  INTEGER NOT NULL,
        distinct_sequences INTEGER NOT NULL
    );
";

/// One row of the `run_log` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLogEntry {
    /// Unix epoch seconds with `Z` suffix
    pub committed_at: String,
    pub summary: RunSummary,
    pub distinct_sequences: u64,
}

/// SQLite-backed store
///
/// The `sequences` table mirrors the visible [`SequenceTable`]. Each commit
/// rewrites it inside one `IMMEDIATE` transaction, so readers of the database
/// observe either the previous run's rows or the new ones, never a mix.
pub struct SqliteSequenceStore {
    conn: Connection,
    path: Option<PathBuf>,
    visible: SequenceTable,
    staging: Option<SequenceTable>,
    pending_run: Option<RunSummary>,
}

impl SqliteSequenceStore {
    /// Open (or create) the database at `path` and load its persisted rows
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))?;
        conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;

        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;

        let mut visible = SequenceTable::new();
        for sequence in read_sequences(&conn, "ORDER BY rowid")? {
            visible.insert_counted(sequence);
        }
        tracing::debug!(records = visible.len(), "loaded persisted sequences");

        Ok(Self {
            conn,
            path,
            visible,
            staging: None,
            pending_run: None,
        })
    }

    /// Database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Rows as persisted on disk, highest count first, ties by row order
    pub fn persisted_sorted_desc(&self) -> Result<Vec<Sequence>> {
        read_sequences(&self.conn, "ORDER BY count DESC, rowid ASC")
    }

    /// The most recent entry of the run log
    pub fn last_run(&self) -> Result<Option<RunLogEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT committed_at, lines_total, lines_skipped, sequences_emitted, distinct_sequences
                 FROM run_log ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        entry
            .map(|(committed_at, total, skipped, emitted, distinct)| {
                Ok(RunLogEntry {
                    committed_at,
                    summary: RunSummary {
                        lines_total: to_u64(total, "lines_total")?,
                        lines_skipped: to_u64(skipped, "lines_skipped")?,
                        sequences_emitted: to_u64(emitted, "sequences_emitted")?,
                    },
                    distinct_sequences: to_u64(distinct, "distinct_sequences")?,
                })
            })
            .transpose()
    }
}

impl SequenceStore for SqliteSequenceStore {
    fn purge(&mut self) -> Result<()> {
        if let Some(staging) = self.staging.as_mut() {
            staging.purge();
            return Ok(());
        }

        // purge-first fallback: previously committed rows are gone from here on
        self.conn.execute("DELETE FROM sequences", [])?;
        self.visible.purge();
        Ok(())
    }

    fn upsert(&mut self, triple: &PathTriple) -> Result<()> {
        self.staging
            .as_mut()
            .unwrap_or(&mut self.visible)
            .upsert(triple);
        Ok(())
    }

    fn commit_unless_cancelled(&mut self, cancelled: &dyn Fn() -> bool) -> Result<()> {
        let table = self.staging.as_ref().unwrap_or(&self.visible);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM sequences", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO sequences (path_1, path_2, path_3, count) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for sequence in table.rows() {
                insert.execute(params![
                    sequence.path_1,
                    sequence.path_2,
                    sequence.path_3,
                    to_i64(sequence.count)?,
                ])?;
            }
        }
        if let Some(run) = self.pending_run {
            tx.execute(
                "INSERT INTO run_log (committed_at, lines_total, lines_skipped, sequences_emitted, distinct_sequences)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    now_epoch_z(),
                    to_i64(run.lines_total)?,
                    to_i64(run.lines_skipped)?,
                    to_i64(run.sequences_emitted)?,
                    to_i64(table.len() as u64)?,
                ],
            )?;
        }
        // dropping an uncommitted transaction rolls it back
        if cancelled() {
            return Err(StoreError::Cancelled);
        }
        tx.commit()?;

        if let Some(staged) = self.staging.take() {
            self.visible = staged;
        }
        self.pending_run = None;
        tracing::debug!(records = self.visible.len(), "committed sequences");
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

fn read_sequences(conn: &Connection, order_by: &str) -> Result<Vec<Sequence>> {
    let sql = format!("SELECT path_1, path_2, path_3, count FROM sequences {order_by}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
        ))
    })?;

    let mut sequences = Vec::new();
    for row in rows {
        let (path_1, path_2, path_3, count) = row?;
        sequences.push(Sequence {
            path_1,
            path_2,
            path_3,
            count: to_u64(count, "count")?,
        });
    }
    Ok(sequences)
}

fn to_u64(value: i64, column: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {column}: {value}")))
}

fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| StoreError::Corrupt(format!("count overflow: {value}")))
}

/// Unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`)
fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}
