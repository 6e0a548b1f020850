//! Check command: configured course totals against the teaching calendar.

use std::io::Write;

use anyhow::Result;
use bunk_core::{Semester, date_key};

/// Prints configured vs. scheduled hours per course, followed by the
/// non-teaching dates the schedule skips. Returns the number of courses whose
/// totals differ.
pub fn run<W: Write>(writer: &mut W, semester: &Semester) -> Result<usize> {
    writeln!(
        writer,
        "{:<8}  {:>10}  {:>9}  {:>10}",
        "Course", "Configured", "Scheduled", "Difference"
    )?;

    let mut mismatched = 0;
    for meta in semester.courses() {
        let configured = i64::from(meta.total_hours);
        let scheduled = i64::from(semester.scheduled_hours(meta.course.as_str()));
        let difference = format!("{:+}", scheduled - configured);
        let verdict = if scheduled == configured {
            "ok"
        } else {
            mismatched += 1;
            "mismatch"
        };
        tracing::debug!(course = %meta.course, configured, scheduled, "checked course total");
        writeln!(
            writer,
            "{:<8}  {configured:>10}  {scheduled:>9}  {difference:>10}  {verdict}",
            meta.course.as_str()
        )?;
    }

    for course in semester.timetable().courses() {
        if semester.course(course.as_str()).is_none() {
            writeln!(writer, "{course}: scheduled but has no course metadata")?;
        }
    }

    write_calendar(writer, semester)?;

    if mismatched == 0 {
        writeln!(writer, "All course totals match the calendar.")?;
    } else {
        writeln!(writer, "{mismatched} course(s) differ from the calendar.")?;
    }
    Ok(mismatched)
}

fn write_calendar<W: Write>(writer: &mut W, semester: &Semester) -> Result<()> {
    let calendar = semester.calendar();
    writeln!(
        writer,
        "Semester {} to {}",
        date_key(calendar.start()),
        date_key(calendar.end())
    )?;
    for (date, name) in calendar.holidays() {
        writeln!(writer, "  holiday  {}  {name}", date_key(date))?;
    }
    for period in calendar.exam_periods() {
        writeln!(
            writer,
            "  exams    {} to {}  {}",
            date_key(period.start),
            date_key(period.end),
            period.name
        )?;
    }
    Ok(())
}
