//! Mark, clear and reset commands.
//!
//! Mutations go through [`MirroredBook`] so the in-memory ledger and the
//! database stay in step. A failed database write is reported as a warning on
//! stderr; it does not fail the command.

use std::io::Write;

use anyhow::{Context, Result};
use bunk_core::{
    AttendanceStatus, BlockId, LedgerMirror, MirroredBook, SyncOutcome, Weekday, date_key,
};
use chrono::NaiveDate;

/// Marks one block and prints the course's updated standing.
pub fn mark<W: Write, M: LedgerMirror>(
    writer: &mut W,
    book: &mut MirroredBook<M>,
    date: NaiveDate,
    block_id: &BlockId,
    status: AttendanceStatus,
) -> Result<()> {
    let outcome = book
        .mark(date, block_id.clone(), status)
        .context("cannot mark attendance")?;
    warn_unsynced(&outcome);

    let block = Weekday::of_date(date)
        .and_then(|day| book.book().semester().timetable().block_on(day, block_id));
    let Some(block) = block else {
        writeln!(writer, "Marked {block_id} on {} as {status}", date_key(date))?;
        return Ok(());
    };

    writeln!(
        writer,
        "Marked {block_id} ({}, {}) on {} as {status}",
        block.course,
        block.time_range(),
        date_key(date)
    )?;
    if let Some(stats) = book.book().projection().course_stats(block.course.as_str()) {
        writeln!(
            writer,
            "{}: {}/{} hours attended ({:.1}%)",
            stats.course, stats.attended, stats.held, stats.current_percentage
        )?;
    }
    Ok(())
}

/// Removes the mark for one block.
pub fn clear<W: Write, M: LedgerMirror>(
    writer: &mut W,
    book: &mut MirroredBook<M>,
    date: NaiveDate,
    block_id: &BlockId,
) -> Result<()> {
    let previous = book.book().ledger().status(date, block_id);
    let outcome = book.clear(date, block_id);
    warn_unsynced(&outcome);

    match previous {
        Some(status) => writeln!(
            writer,
            "Cleared {block_id} on {} (was {status})",
            date_key(date)
        )?,
        None => writeln!(writer, "{block_id} on {} was not marked", date_key(date))?,
    }
    Ok(())
}

/// Deletes every mark. Refuses to run without `confirmed`.
pub fn reset<W: Write, M: LedgerMirror>(
    writer: &mut W,
    book: &mut MirroredBook<M>,
    confirmed: bool,
) -> Result<()> {
    anyhow::ensure!(
        confirmed,
        "reset deletes all attendance marks; re-run with --yes to confirm"
    );
    let removed = book.book().ledger().len();
    let outcome = book.reset_all();
    warn_unsynced(&outcome);
    writeln!(writer, "Removed {removed} attendance marks")?;
    Ok(())
}

fn warn_unsynced(outcome: &SyncOutcome) {
    if let SyncOutcome::Failed { message } = outcome {
        eprintln!("warning: change was not saved to the database: {message}");
    }
}
