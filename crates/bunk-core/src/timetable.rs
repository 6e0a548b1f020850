//! Weekly timetable and block grouping.
//!
//! A timetable is a static list of one-hour slots. Consecutive slots of the
//! same course on the same day form a [`ClassBlock`], which is the unit the
//! student marks attendance for. Blocks are derived on every read; nothing here
//! holds mutable state.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{BlockId, CourseCode, SlotId};

/// Minute past the hour at which every class ends.
pub const CLASS_END_MINUTE: u32 = 50;

/// Timetable configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimetableError {
    /// Weekday name not in Monday..Friday.
    #[error("unknown weekday: {0}")]
    UnknownWeekday(String),

    /// A slot start hour outside 0..=23.
    #[error("slot {slot_id} has invalid start hour {hour}")]
    InvalidStartHour { slot_id: String, hour: u8 },

    /// Two slots share the same ID.
    #[error("duplicate slot id: {0}")]
    DuplicateSlot(String),
}

/// A teaching weekday. Weekends never carry slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Self; 5] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
    ];

    /// Returns the teaching weekday of a date, or `None` on weekends.
    pub const fn from_chrono(day: chrono::Weekday) -> Option<Self> {
        match day {
            chrono::Weekday::Mon => Some(Self::Monday),
            chrono::Weekday::Tue => Some(Self::Tuesday),
            chrono::Weekday::Wed => Some(Self::Wednesday),
            chrono::Weekday::Thu => Some(Self::Thursday),
            chrono::Weekday::Fri => Some(Self::Friday),
            chrono::Weekday::Sat | chrono::Weekday::Sun => None,
        }
    }

    pub fn of_date(date: NaiveDate) -> Option<Self> {
        Self::from_chrono(date.weekday())
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(Self::Monday),
            "tuesday" | "tue" => Ok(Self::Tuesday),
            "wednesday" | "wed" => Ok(Self::Wednesday),
            "thursday" | "thu" => Ok(Self::Thursday),
            "friday" | "fri" => Ok(Self::Friday),
            _ => Err(TimetableError::UnknownWeekday(s.to_string())),
        }
    }
}

/// One fixed one-hour class slot in the weekly timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySlot {
    pub id: SlotId,
    pub weekday: Weekday,
    pub start_hour: u8,
    pub course: CourseCode,
    pub room: String,
    #[serde(default)]
    pub is_lab: bool,
    #[serde(default)]
    pub is_oe: bool,
}

/// Consecutive same-course slots merged into one attendance unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassBlock {
    pub block_id: BlockId,
    pub course: CourseCode,
    /// Room of the first slot.
    pub room: String,
    pub start_hour: u8,
    /// Start hour of the last slot; the block ends at `end_hour:50`.
    pub end_hour: u8,
    pub duration_hours: u32,
    pub slot_ids: Vec<SlotId>,
    pub is_lab: bool,
    pub is_oe: bool,
}

impl ClassBlock {
    fn open(slot: &WeeklySlot) -> Self {
        Self {
            block_id: BlockId::for_first_slot(&slot.id),
            course: slot.course.clone(),
            room: slot.room.clone(),
            start_hour: slot.start_hour,
            end_hour: slot.start_hour,
            duration_hours: 1,
            slot_ids: vec![slot.id.clone()],
            is_lab: slot.is_lab,
            is_oe: slot.is_oe,
        }
    }

    fn accepts(&self, slot: &WeeklySlot) -> bool {
        self.course == slot.course && u16::from(slot.start_hour) == u16::from(self.end_hour) + 1
    }

    fn extend(&mut self, slot: &WeeklySlot) {
        self.end_hour = slot.start_hour;
        self.duration_hours += 1;
        self.slot_ids.push(slot.id.clone());
        self.is_lab |= slot.is_lab;
        self.is_oe |= slot.is_oe;
    }

    /// Minute of the day the block starts.
    pub fn start_minute(&self) -> u32 {
        u32::from(self.start_hour) * 60
    }

    /// Minute of the day the block ends (exclusive).
    pub fn end_minute(&self) -> u32 {
        u32::from(self.end_hour) * 60 + CLASS_END_MINUTE
    }

    /// Wall-clock range, e.g. `09:00-10:50`.
    pub fn time_range(&self) -> String {
        format!(
            "{:02}:00-{:02}:{CLASS_END_MINUTE:02}",
            self.start_hour, self.end_hour
        )
    }
}

/// Groups one day's slots into blocks.
///
/// Slots are re-sorted by start hour (ties broken by slot ID) so the result
/// depends only on the set of slots. A slot extends the open block only when
/// it has the same course and starts exactly one hour after the block's last
/// slot; anything else closes the block and opens a new one.
pub fn group_into_blocks(slots: &[WeeklySlot]) -> Vec<ClassBlock> {
    let mut sorted: Vec<&WeeklySlot> = slots.iter().collect();
    sorted.sort_by(|a, b| a.start_hour.cmp(&b.start_hour).then_with(|| a.id.cmp(&b.id)));

    let mut blocks = Vec::new();
    let mut current: Option<ClassBlock> = None;
    for slot in sorted {
        if let Some(block) = current.as_mut() {
            if block.accepts(slot) {
                block.extend(slot);
                continue;
            }
        }
        if let Some(done) = current.replace(ClassBlock::open(slot)) {
            blocks.push(done);
        }
    }
    blocks.extend(current);
    blocks
}

/// The static weekly timetable.
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    slots: Vec<WeeklySlot>,
}

impl Timetable {
    /// Builds a timetable, rejecting duplicate slot IDs and invalid hours.
    pub fn new(slots: Vec<WeeklySlot>) -> Result<Self, TimetableError> {
        let mut seen = HashSet::new();
        for slot in &slots {
            if slot.start_hour > 23 {
                return Err(TimetableError::InvalidStartHour {
                    slot_id: slot.id.to_string(),
                    hour: slot.start_hour,
                });
            }
            if !seen.insert(slot.id.as_str()) {
                return Err(TimetableError::DuplicateSlot(slot.id.to_string()));
            }
        }
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[WeeklySlot] {
        &self.slots
    }

    /// Returns the slots scheduled on `day`.
    pub fn slots_for_day(&self, day: Weekday) -> Vec<WeeklySlot> {
        self.slots
            .iter()
            .filter(|slot| slot.weekday == day)
            .cloned()
            .collect()
    }

    /// Returns the blocks scheduled on `day`, ordered by start hour.
    pub fn blocks_for_day(&self, day: Weekday) -> Vec<ClassBlock> {
        group_into_blocks(&self.slots_for_day(day))
    }

    /// Returns the blocks scheduled on a date; empty on weekends.
    pub fn blocks_for_date(&self, date: NaiveDate) -> Vec<ClassBlock> {
        Weekday::of_date(date).map_or_else(Vec::new, |day| self.blocks_for_day(day))
    }

    /// Finds a block by ID among the blocks of `day`.
    pub fn block_on(&self, day: Weekday, block_id: &BlockId) -> Option<ClassBlock> {
        self.blocks_for_day(day)
            .into_iter()
            .find(|block| &block.block_id == block_id)
    }

    /// All of a course's blocks across the week, paired with their weekday.
    pub fn all_blocks_for_course(&self, course: &str) -> Vec<(Weekday, ClassBlock)> {
        Weekday::ALL
            .into_iter()
            .flat_map(|day| {
                self.blocks_for_day(day)
                    .into_iter()
                    .filter(|block| block.course.as_str() == course)
                    .map(move |block| (day, block))
            })
            .collect()
    }

    /// Teaching hours per week for a course.
    pub fn weekly_hours(&self, course: &str) -> u32 {
        self.all_blocks_for_course(course)
            .iter()
            .map(|(_, block)| block.duration_hours)
            .sum()
    }

    /// Sorted unique course codes appearing in the timetable.
    pub fn courses(&self) -> Vec<CourseCode> {
        self.slots
            .iter()
            .map(|slot| slot.course.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Returns the block in session at `hour:minute` on `day`.
    pub fn current_block(&self, day: Weekday, hour: u32, minute: u32) -> Option<ClassBlock> {
        let now = hour * 60 + minute;
        self.blocks_for_day(day)
            .into_iter()
            .find(|block| block.start_minute() <= now && now < block.end_minute())
    }

    /// Returns the first block starting after `hour:minute` on `day`.
    pub fn next_block(&self, day: Weekday, hour: u32, minute: u32) -> Option<ClassBlock> {
        let now = hour * 60 + minute;
        self.blocks_for_day(day)
            .into_iter()
            .find(|block| block.start_minute() > now)
    }
}
