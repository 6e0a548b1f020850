//! Implementation of the `bunk export` command.
//!
//! Writes every stored mark as one JSON object per line, ordered by date and
//! then block ID.

use std::io::Write;

use anyhow::{Context, Result};
use bunk_db::Database;

/// Writes all stored marks as JSONL. Returns the number of records written.
pub fn run<W: Write>(writer: &mut W, db: &Database) -> Result<usize> {
    let records = db
        .list_records()
        .context("failed to read stored attendance")?;
    for record in &records {
        serde_json::to_writer(&mut *writer, record).context("failed to serialize record")?;
        // Handle broken pipe gracefully (e.g., when piped to `head`)
        if writeln!(writer).is_err() {
            break;
        }
    }
    Ok(records.len())
}
