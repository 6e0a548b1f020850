//! Now command: the class in session and the one after it.

use std::io::Write;

use anyhow::Result;
use bunk_core::{ClassBlock, Semester, Weekday, date_key};
use chrono::{NaiveDateTime, Timelike};

pub fn run<W: Write>(writer: &mut W, semester: &Semester, at: NaiveDateTime) -> Result<()> {
    let date = at.date();
    writeln!(
        writer,
        "{} {} ({})",
        date_key(date),
        at.format("%H:%M"),
        date.format("%A")
    )?;

    let fact = semester.calendar().classify(date);
    let day = Weekday::of_date(date);
    let Some(day) = day.filter(|_| fact.is_teaching_day()) else {
        writeln!(writer, "No classes today: {fact}")?;
        return Ok(());
    };

    let timetable = semester.timetable();
    let (hour, minute) = (at.hour(), at.minute());
    match timetable.current_block(day, hour, minute) {
        Some(block) => writeln!(writer, "Now:  {}", describe(&block))?,
        None => writeln!(writer, "Now:  no class in session")?,
    }
    match timetable.next_block(day, hour, minute) {
        Some(block) => writeln!(writer, "Next: {}", describe(&block))?,
        None => writeln!(writer, "Next: no more classes today")?,
    }
    Ok(())
}

fn describe(block: &ClassBlock) -> String {
    format!(
        "{} {} in {} ({})",
        block.course,
        block.time_range(),
        block.room,
        block.block_id
    )
}
