//! Status command for the overall bunk verdict.

use std::io::Write;

use anyhow::Result;

use bunk_core::{AttendanceBook, BunkStatus};

pub fn run<W: Write>(writer: &mut W, book: &AttendanceBook, json: bool) -> Result<()> {
    let status = book.projection().worst_course_status();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&status)?)?;
        return Ok(());
    }

    if let Some(name) = book.semester().name() {
        writeln!(writer, "{name}")?;
    }
    writeln!(writer, "{}", status.message())?;

    if !matches!(status, BunkStatus::NoData) {
        let at_risk: Vec<String> = book
            .projection()
            .all_course_stats()
            .into_iter()
            .filter(|stats| stats.held > 0 && stats.band.is_at_risk())
            .map(|stats| format!("{} ({:.1}%)", stats.course, stats.current_percentage))
            .collect();
        if !at_risk.is_empty() {
            writeln!(writer, "Below 75%: {}", at_risk.join(", "))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bunk_core::{AttendanceStatus, BlockId, parse_date_key};
    use insta::assert_snapshot;

    use crate::semester::load_semester;

    fn book() -> AttendanceBook {
        AttendanceBook::new(load_semester(None).unwrap())
    }

    fn mark(book: &mut AttendanceBook, date: &str, block: &str, status: AttendanceStatus) {
        book.mark(
            parse_date_key(date).unwrap(),
            BlockId::new(block).unwrap(),
            status,
        )
        .unwrap();
    }

    #[test]
    fn status_without_marks_prompts_to_start() {
        let mut output = Vec::new();
        run(&mut output, &book(), false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Even Semester 2025-26
        Start marking attendance to see bunk status
        ");
    }

    #[test]
    fn status_reports_the_weakest_course() {
        let mut book = book();
        mark(&mut book, "2026-01-05", "block_mon1", AttendanceStatus::Present);
        mark(&mut book, "2026-01-05", "block_mon5", AttendanceStatus::Absent);
        mark(&mut book, "2026-01-05", "block_mon7", AttendanceStatus::Absent);

        let mut output = Vec::new();
        run(&mut output, &book, false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Even Semester 2025-26
        CSE 306: Attend 56 hours to reach 75%
        Below 75%: CSE 306 (0.0%), CSE 423 (0.0%)
        ");
    }

    #[test]
    fn status_json_is_tagged() {
        let mut book = book();
        mark(&mut book, "2026-01-05", "block_mon1", AttendanceStatus::Present);

        let mut output = Vec::new();
        run(&mut output, &book, true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["status"], "safe");
        assert_eq!(value["course"], "LBA 253");
        assert_eq!(value["can_bunk"], 11);
    }
}
