//! Validated attendance book: a semester plus the student's ledger.

use chrono::NaiveDate;
use thiserror::Error;

use crate::calendar::date_key;
use crate::ledger::{AttendanceRecord, Ledger};
use crate::projection::Projection;
use crate::semester::Semester;
use crate::timetable::Weekday;
use crate::types::{AttendanceStatus, BlockId, CourseCode};

/// Rejected attendance marks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The block is not scheduled on the date's weekday.
    #[error("no block {block_id} on {date}")]
    UnknownBlock { date: String, block_id: BlockId },

    /// The course had not started yet on this date.
    #[error("{course} starts on {start}; cannot mark {date}")]
    BeforeCourseStart {
        course: CourseCode,
        date: String,
        start: String,
    },
}

/// Counts from a bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub applied: usize,
    pub skipped: usize,
}

/// Owns the ledger and validates marks against the semester timetable.
#[derive(Debug, Clone)]
pub struct AttendanceBook {
    semester: Semester,
    ledger: Ledger,
}

impl AttendanceBook {
    pub fn new(semester: Semester) -> Self {
        Self {
            semester,
            ledger: Ledger::new(),
        }
    }

    pub const fn semester(&self) -> &Semester {
        &self.semester
    }

    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub const fn projection(&self) -> Projection<'_> {
        Projection::new(&self.semester, &self.ledger)
    }

    /// Checks that `block_id` can be marked on `date`.
    pub fn validate(&self, date: NaiveDate, block_id: &BlockId) -> Result<(), LedgerError> {
        let block = Weekday::of_date(date)
            .and_then(|day| self.semester.timetable().block_on(day, block_id))
            .ok_or_else(|| LedgerError::UnknownBlock {
                date: date_key(date),
                block_id: block_id.clone(),
            })?;

        if self.semester.enforce_course_start() {
            let start = self
                .semester
                .calendar()
                .course_start_date(block.course.as_str());
            if date < start {
                return Err(LedgerError::BeforeCourseStart {
                    course: block.course,
                    date: date_key(date),
                    start: date_key(start),
                });
            }
        }
        Ok(())
    }

    /// Marks a block, returning the status it replaced.
    pub fn mark(
        &mut self,
        date: NaiveDate,
        block_id: BlockId,
        status: AttendanceStatus,
    ) -> Result<Option<AttendanceStatus>, LedgerError> {
        self.validate(date, &block_id)?;
        Ok(self.ledger.mark(date, block_id, status))
    }

    /// Clears a mark. No-op if the block was unmarked.
    pub fn clear(&mut self, date: NaiveDate, block_id: &BlockId) -> Option<AttendanceStatus> {
        self.ledger.clear(date, block_id)
    }

    pub fn reset_all(&mut self) {
        self.ledger.reset_all();
    }

    /// Applies flat records, skipping those that fail validation.
    pub fn import(&mut self, records: impl IntoIterator<Item = AttendanceRecord>) -> ImportSummary {
        let mut summary = ImportSummary::default();
        for record in records {
            if let Err(err) = self.validate(record.date, &record.block_id) {
                tracing::warn!(error = %err, "skipping attendance record");
                summary.skipped += 1;
                continue;
            }
            self.ledger.mark(record.date, record.block_id, record.status);
            summary.applied += 1;
        }
        tracing::debug!(
            applied = summary.applied,
            skipped = summary.skipped,
            "imported attendance records"
        );
        summary
    }
}
