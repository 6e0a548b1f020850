//! Storage layer for attendance marks.
//!
//! Provides persistence for the attendance ledger using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! One row per marked block. Dates are stored as `YYYY-MM-DD` TEXT so that
//! lexicographic order matches chronological order; `updated_at` is an
//! RFC 3339 UTC timestamp. Writes are last-write-wins on `(date, block_id)`.

use std::path::Path;

use bunk_core::{
    AttendanceRecord, AttendanceStatus, BlockId, LedgerMirror, MirrorError, date_key,
    parse_date_key,
};
use chrono::{NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored row could not be turned back into a record.
    #[error("invalid attendance row ({date}, {block_id}): {message}")]
    InvalidRecord {
        date: String,
        block_id: String,
        message: String,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS attendance (
                date TEXT NOT NULL,
                block_id TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('present', 'absent')),
                updated_at TEXT NOT NULL,
                PRIMARY KEY (date, block_id)
            );

            CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date);
            ",
        )?;
        Ok(())
    }

    /// Inserts or overwrites a single mark.
    pub fn upsert_record(&self, record: &AttendanceRecord) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO attendance (date, block_id, status, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (date, block_id)
            DO UPDATE SET status = excluded.status, updated_at = excluded.updated_at
            ",
            params![
                date_key(record.date),
                record.block_id.as_str(),
                record.status.as_str(),
                now_timestamp()
            ],
        )?;
        Ok(())
    }

    /// Inserts or overwrites a batch of marks in one transaction. Returns the
    /// number of records written; a repeated `(date, block_id)` counts each time.
    pub fn upsert_records(&mut self, records: &[AttendanceRecord]) -> Result<usize, DbError> {
        if records.is_empty() {
            return Ok(0);
        }
        let updated_at = now_timestamp();
        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO attendance (date, block_id, status, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (date, block_id)
                DO UPDATE SET status = excluded.status, updated_at = excluded.updated_at
                ",
            )?;
            for record in records {
                written += stmt.execute(params![
                    date_key(record.date),
                    record.block_id.as_str(),
                    record.status.as_str(),
                    updated_at
                ])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Deletes one mark. Returns whether a row was removed.
    pub fn delete_record(&self, date: NaiveDate, block_id: &BlockId) -> Result<bool, DbError> {
        let removed = self.conn.execute(
            "DELETE FROM attendance WHERE date = ?1 AND block_id = ?2",
            params![date_key(date), block_id.as_str()],
        )?;
        Ok(removed > 0)
    }

    /// Deletes every mark. Returns the number of rows removed.
    pub fn delete_all(&self) -> Result<usize, DbError> {
        Ok(self.conn.execute("DELETE FROM attendance", [])?)
    }

    /// Lists every mark ordered by date, then block.
    pub fn list_records(&self) -> Result<Vec<AttendanceRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, block_id, status FROM attendance ORDER BY date, block_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (date, block_id, status) = row?;
            records.push(parse_row(&date, &block_id, &status)?);
        }
        Ok(records)
    }

    /// Number of stored marks.
    pub fn count_records(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM attendance", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn parse_row(date: &str, block_id: &str, status: &str) -> Result<AttendanceRecord, DbError> {
    let invalid = |message: String| DbError::InvalidRecord {
        date: date.to_string(),
        block_id: block_id.to_string(),
        message,
    };
    Ok(AttendanceRecord {
        date: parse_date_key(date).map_err(|e| invalid(e.to_string()))?,
        block_id: BlockId::new(block_id).map_err(|e| invalid(e.to_string()))?,
        status: status
            .parse::<AttendanceStatus>()
            .map_err(|e| invalid(e.to_string()))?,
    })
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl LedgerMirror for Database {
    fn record_mark(&mut self, record: &AttendanceRecord) -> Result<(), MirrorError> {
        self.upsert_record(record)
            .map_err(|e| MirrorError::new(e.to_string()))
    }

    fn record_clear(
        &mut self,
        date: NaiveDate,
        block_id: &BlockId,
    ) -> Result<(), MirrorError> {
        self.delete_record(date, block_id)
            .map(|_| ())
            .map_err(|e| MirrorError::new(e.to_string()))
    }

    fn record_reset(&mut self) -> Result<(), MirrorError> {
        let removed = self
            .delete_all()
            .map_err(|e| MirrorError::new(e.to_string()))?;
        tracing::debug!(removed, "cleared stored attendance");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bunk_core::Ledger;

    fn record(date: &str, block: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            date: parse_date_key(date).unwrap(),
            block_id: BlockId::new(block).unwrap(),
            status,
        }
    }

    #[test]
    fn open_in_memory_starts_empty() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.count_records().unwrap(), 0);
        assert!(db.list_records().unwrap().is_empty());
    }

    #[test]
    fn upsert_overwrites_existing_mark() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_record(&record("2026-01-05", "block_mon1", AttendanceStatus::Present))
            .unwrap();
        db.upsert_record(&record("2026-01-05", "block_mon1", AttendanceStatus::Absent))
            .unwrap();

        let records = db.list_records().unwrap();
        assert_eq!(
            records,
            vec![record("2026-01-05", "block_mon1", AttendanceStatus::Absent)]
        );
    }

    #[test]
    fn delete_record_reports_whether_row_existed() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_record(&record("2026-01-05", "block_mon1", AttendanceStatus::Present))
            .unwrap();
        let date = parse_date_key("2026-01-05").unwrap();
        let block = BlockId::new("block_mon1").unwrap();
        assert!(db.delete_record(date, &block).unwrap());
        assert!(!db.delete_record(date, &block).unwrap());
    }

    #[test]
    fn batch_upsert_round_trips_ledger() {
        let mut db = Database::open_in_memory().unwrap();
        let records = vec![
            record("2026-01-07", "block_wed2", AttendanceStatus::Present),
            record("2026-01-05", "block_mon4", AttendanceStatus::Absent),
            record("2026-01-05", "block_mon1", AttendanceStatus::Present),
        ];
        assert_eq!(db.upsert_records(&records).unwrap(), 3);

        let stored = Ledger::from_records(db.list_records().unwrap());
        assert_eq!(stored, Ledger::from_records(records));
    }

    #[test]
    fn mirror_reset_clears_table() {
        let mut db = Database::open_in_memory().unwrap();
        db.record_mark(&record("2026-01-05", "block_mon1", AttendanceStatus::Present))
            .unwrap();
        db.record_reset().unwrap();
        assert_eq!(db.count_records().unwrap(), 0);
    }

    #[test]
    fn corrupt_rows_are_reported() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO attendance (date, block_id, status, updated_at) VALUES ('05/01/2026', 'block_mon1', 'present', 'x')",
                [],
            )
            .unwrap();
        assert!(matches!(
            db.list_records(),
            Err(DbError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn open_persists_to_disk() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bunk.db");
        {
            let db = Database::open(&path).unwrap();
            db.upsert_record(&record("2026-01-05", "block_mon1", AttendanceStatus::Present))
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.count_records().unwrap(), 1);
    }
}
