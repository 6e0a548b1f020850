//! Stats command: per-course attendance projections.

use std::io::Write;

use anyhow::Result;
use bunk_core::{AttendanceBook, DetailedCourseStats, hours_label as hours};

pub fn run<W: Write>(
    writer: &mut W,
    book: &AttendanceBook,
    course: Option<&str>,
    json: bool,
) -> Result<()> {
    let projection = book.projection();

    let Some(course) = course else {
        let all = projection.all_course_stats();
        if json {
            writeln!(writer, "{}", serde_json::to_string_pretty(&all)?)?;
        } else {
            write_table(writer, &all)?;
        }
        return Ok(());
    };

    let Some(stats) = projection.course_stats(course) else {
        let known: Vec<&str> = book
            .semester()
            .courses()
            .map(|meta| meta.course.as_str())
            .collect();
        anyhow::bail!("unknown course `{course}` (known: {})", known.join(", "));
    };

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        write_detail(writer, &stats)?;
    }
    Ok(())
}

fn write_table<W: Write>(writer: &mut W, all: &[DetailedCourseStats]) -> Result<()> {
    writeln!(
        writer,
        "{:<8}  {:>8}  {:>4}  {:>5}  {:>7}  {:>8}  {:>11}  Status",
        "Course", "Attended", "Held", "Total", "Current", "Can bunk", "Must attend"
    )?;
    for stats in all {
        let current = format!("{:.1}%", stats.current_percentage);
        writeln!(
            writer,
            "{:<8}  {:>8}  {:>4}  {:>5}  {:>7}  {:>8}  {:>11}  {}",
            stats.course.as_str(),
            stats.attended,
            stats.held,
            stats.total_hours,
            current,
            stats.can_bunk_without_od,
            stats.must_attend_for_75,
            stats.band
        )?;
    }
    Ok(())
}

fn write_detail<W: Write>(writer: &mut W, stats: &DetailedCourseStats) -> Result<()> {
    writeln!(writer, "{} - {}", stats.course, stats.title)?;
    writeln!(
        writer,
        "  Attended:        {} of {} held ({:.1}%)",
        stats.attended,
        hours(stats.held),
        stats.current_percentage
    )?;
    writeln!(writer, "  Missed:          {}", hours(stats.missed))?;
    writeln!(
        writer,
        "  Remaining:       {} of {}",
        stats.remaining,
        hours(stats.total_hours)
    )?;
    writeln!(writer, "  Required (75%):  {}", hours(stats.required_for_75))?;
    writeln!(
        writer,
        "  Must attend:     {}",
        hours(stats.must_attend_for_75)
    )?;
    writeln!(
        writer,
        "  Can bunk:        {} without OD/ML, {} with OD/ML ({} allowed)",
        hours(stats.can_bunk_without_od),
        hours(stats.can_bunk_with_od),
        stats.od_ml_allowance
    )?;
    writeln!(
        writer,
        "  Projected:       {:.1}% (worst) to {:.1}% (best)",
        stats.projected_worst, stats.projected_best
    )?;
    writeln!(writer, "  Safety margin:   {:+}", stats.safety_margin)?;
    writeln!(writer, "  Status:          {}", stats.band)?;
    if !stats.rooms.is_empty() {
        writeln!(writer, "  Rooms:           {}", stats.rooms.join(", "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bunk_core::{AttendanceStatus, BlockId, parse_date_key};
    use insta::assert_snapshot;

    use crate::semester::load_semester;

    fn book_with_marks() -> AttendanceBook {
        let mut book = AttendanceBook::new(load_semester(None).unwrap());
        let day = parse_date_key("2026-01-05").unwrap();
        for (block, status) in [
            ("block_mon1", AttendanceStatus::Present),
            ("block_mon2", AttendanceStatus::Present),
            ("block_mon5", AttendanceStatus::Absent),
        ] {
            book.mark(day, BlockId::new(block).unwrap(), status).unwrap();
        }
        book
    }

    #[test]
    fn stats_table_covers_every_course() {
        let book = book_with_marks();
        let mut output = Vec::new();
        run(&mut output, &book, None, false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Course    Attended  Held  Total  Current  Can bunk  Must attend  Status
        CSE 304          0     0     45     0.0%        11           34  safe
        CSE 306          0     2     74     0.0%        16           56  critical
        CSE 423          0     0     30     0.0%         7           23  safe
        CSE 455          2     2     76   100.0%        19           55  safe
        CSE 456          0     0     73     0.0%        18           55  safe
        FLC 120          0     0     44     0.0%        11           33  safe
        LBA 253          1     1     45   100.0%        11           33  safe
        SEC 176          0     0     42     0.0%        10           32  safe
        ");
    }

    #[test]
    fn stats_detail_for_one_course() {
        let book = book_with_marks();
        let mut output = Vec::new();
        run(&mut output, &book, Some("CSE 455"), false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        CSE 455 - Artificial Intelligence
          Attended:        2 of 2 hours held (100.0%)
          Missed:          0 hours
          Remaining:       74 of 76 hours
          Required (75%):  57 hours
          Must attend:     55 hours
          Can bunk:        19 hours without OD/ML, 37 hours with OD/ML (12 allowed)
          Projected:       2.6% (worst) to 100.0% (best)
          Safety margin:   +0
          Status:          safe
          Rooms:           S412, C707
        ");
    }

    #[test]
    fn stats_json_for_one_course() {
        let book = book_with_marks();
        let mut output = Vec::new();
        run(&mut output, &book, Some("CSE 306"), true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["course"], "CSE 306");
        assert_eq!(value["missed"], 2);
        assert_eq!(value["can_bunk_without_od"], 16);
        assert_eq!(value["band"], "critical");
    }

    #[test]
    fn unknown_course_is_an_error() {
        let book = book_with_marks();
        let mut output = Vec::new();
        let err = run(&mut output, &book, Some("XYZ 101"), false).unwrap_err();
        assert!(err.to_string().starts_with("unknown course `XYZ 101`"));
    }
}
