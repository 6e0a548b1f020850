//! Import command for loading JSONL attendance marks into the local `SQLite` store.

use std::io::BufRead;

use anyhow::{Context, Result};
use bunk_core::{AttendanceBook, AttendanceRecord, ImportSummary, Ledger};
use bunk_db::Database;

/// Reads marks from `reader` and stores the ones that fit the timetable.
///
/// Malformed lines abort the import before anything is written. Records for
/// blocks that do not exist on their date are skipped with a warning. When a
/// `(date, block_id)` appears more than once, the last line wins and the mark
/// counts once.
pub fn run<R: BufRead>(
    reader: R,
    book: &AttendanceBook,
    db: &mut Database,
) -> Result<ImportSummary> {
    let records = parse_records(reader)?;

    let mut summary = ImportSummary::default();
    let mut valid = Vec::with_capacity(records.len());
    for record in records {
        match book.validate(record.date, &record.block_id) {
            Ok(()) => valid.push(record),
            Err(err) => {
                tracing::warn!(error = %err, "skipping imported record");
                summary.skipped += 1;
            }
        }
    }

    let marks = Ledger::from_records(valid).to_records();
    summary.applied = db
        .upsert_records(&marks)
        .context("failed to store imported attendance")?;
    Ok(summary)
}

fn parse_records<R: BufRead>(reader: R) -> Result<Vec<AttendanceRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: AttendanceRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid record on line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}
