//! Shared utilities for CLI commands.

use anyhow::{Context, Result};
use bunk_core::{AttendanceBook, Semester};
use bunk_db::Database;
use chrono::{Local, NaiveDate};

/// Rebuilds the attendance book from the marks stored in `db`.
///
/// Stored marks that no longer fit the timetable are skipped with a warning.
pub fn load_book(db: &Database, semester: Semester) -> Result<AttendanceBook> {
    let records = db
        .list_records()
        .context("failed to read stored attendance")?;
    let mut book = AttendanceBook::new(semester);
    let summary = book.import(records);
    if summary.skipped > 0 {
        tracing::warn!(
            skipped = summary.skipped,
            "ignored stored marks that do not match the timetable"
        );
    }
    Ok(book)
}

/// Today's date in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
