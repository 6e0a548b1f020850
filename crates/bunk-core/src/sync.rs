//! Mirroring ledger mutations to an external store.
//!
//! The local [`AttendanceBook`] is always the source of truth. Each mutation is
//! applied locally first and then handed to a [`LedgerMirror`]; a failing
//! mirror is logged and reported as [`SyncOutcome::Failed`], and the local
//! change is kept.

use chrono::NaiveDate;
use thiserror::Error;

use crate::book::{AttendanceBook, LedgerError};
use crate::ledger::AttendanceRecord;
use crate::types::{AttendanceStatus, BlockId};

/// Failure reported by a mirror.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MirrorError {
    pub message: String,
}

impl MirrorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A store that receives a copy of every ledger mutation.
pub trait LedgerMirror {
    fn record_mark(&mut self, record: &AttendanceRecord) -> Result<(), MirrorError>;

    fn record_clear(&mut self, date: NaiveDate, block_id: &BlockId) -> Result<(), MirrorError>;

    fn record_reset(&mut self) -> Result<(), MirrorError>;
}

/// Result of mirroring a mutation that was applied locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    /// The mirror failed; the local change stands.
    Failed { message: String },
}

impl SyncOutcome {
    fn from_result(operation: &'static str, result: Result<(), MirrorError>) -> Self {
        match result {
            Ok(()) => Self::Synced,
            Err(err) => {
                tracing::warn!(operation, error = %err, "failed to mirror ledger change; kept locally");
                Self::Failed {
                    message: err.message,
                }
            }
        }
    }

    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }
}

/// An attendance book whose mutations are mirrored to `M`.
#[derive(Debug)]
pub struct MirroredBook<M> {
    book: AttendanceBook,
    mirror: M,
}

impl<M: LedgerMirror> MirroredBook<M> {
    pub const fn new(book: AttendanceBook, mirror: M) -> Self {
        Self { book, mirror }
    }

    pub const fn book(&self) -> &AttendanceBook {
        &self.book
    }

    pub const fn mirror(&self) -> &M {
        &self.mirror
    }

    /// Marks locally, then mirrors. Validation errors are returned before
    /// anything is changed.
    pub fn mark(
        &mut self,
        date: NaiveDate,
        block_id: BlockId,
        status: AttendanceStatus,
    ) -> Result<SyncOutcome, LedgerError> {
        let record = AttendanceRecord {
            date,
            block_id: block_id.clone(),
            status,
        };
        self.book.mark(date, block_id, status)?;
        Ok(SyncOutcome::from_result(
            "mark",
            self.mirror.record_mark(&record),
        ))
    }

    pub fn clear(&mut self, date: NaiveDate, block_id: &BlockId) -> SyncOutcome {
        self.book.clear(date, block_id);
        SyncOutcome::from_result("clear", self.mirror.record_clear(date, block_id))
    }

    pub fn reset_all(&mut self) -> SyncOutcome {
        self.book.reset_all();
        SyncOutcome::from_result("reset", self.mirror.record_reset())
    }
}
