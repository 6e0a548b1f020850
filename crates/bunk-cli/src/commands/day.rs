//! Day command: the blocks scheduled on a date and how they were marked.

use std::io::Write;

use anyhow::Result;
use bunk_core::{
    AttendanceBook, AttendanceStatus, BlockId, CalendarFact, CourseCode, DateSummary, date_key,
};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DayView {
    date: String,
    weekday: String,
    calendar: CalendarFact,
    blocks: Vec<DayBlock>,
    summary: DateSummary,
}

#[derive(Debug, Serialize)]
struct DayBlock {
    block_id: BlockId,
    course: CourseCode,
    time: String,
    room: String,
    duration_hours: u32,
    is_lab: bool,
    status: Option<AttendanceStatus>,
}

fn build_view(book: &AttendanceBook, date: NaiveDate) -> DayView {
    let semester = book.semester();
    let marks = book.ledger().records_for_date(date);
    let blocks = semester
        .timetable()
        .blocks_for_date(date)
        .into_iter()
        .map(|block| DayBlock {
            status: marks.get(&block.block_id).copied(),
            time: block.time_range(),
            block_id: block.block_id,
            course: block.course,
            room: block.room,
            duration_hours: block.duration_hours,
            is_lab: block.is_lab,
        })
        .collect();

    DayView {
        date: date_key(date),
        weekday: date.format("%A").to_string(),
        calendar: semester.calendar().classify(date),
        blocks,
        summary: book.projection().date_summary(date),
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    book: &AttendanceBook,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    let view = build_view(book, date);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&view)?)?;
        return Ok(());
    }

    writeln!(writer, "{} ({}): {}", view.date, view.weekday, view.calendar)?;
    if view.blocks.is_empty() {
        return Ok(());
    }

    writeln!(writer)?;
    for block in &view.blocks {
        let status = block.status.map_or("-", |status| status.as_str());
        let lab = if block.is_lab { " (lab)" } else { "" };
        writeln!(
            writer,
            "  {:<12} {}  {:<8} {:<6} {status}{lab}",
            block.block_id.as_str(),
            block.time,
            block.course.as_str(),
            block.room,
        )?;
    }
    writeln!(writer)?;
    writeln!(
        writer,
        "Present: {}h  Absent: {}h",
        view.summary.present, view.summary.absent
    )?;
    Ok(())
}
