//! Core domain logic for the attendance tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Calendar: classifying dates into teaching and non-teaching days
//! - Timetable: grouping weekly slots into attendance blocks
//! - Ledger: the sparse record of present/absent marks
//! - Projection: percentages, bunk allowances and semester projections

pub mod book;
pub mod calendar;
pub mod ledger;
pub mod projection;
pub mod semester;
pub mod sync;
pub mod timetable;
pub mod types;

pub use book::{AttendanceBook, ImportSummary, LedgerError};
pub use calendar::{Calendar, CalendarError, CalendarFact, ExamPeriod, date_key, parse_date_key};
pub use ledger::{AttendanceRecord, Ledger};
pub use projection::{
    BunkStatus, CourseHours, DateSummary, DetailedCourseStats, Projection, StatusBand,
    SubjectStanding, SubjectSummary, hours_label,
};
pub use semester::{CourseMetadata, CourseSpec, Semester, SemesterError, SemesterSpec};
pub use sync::{LedgerMirror, MirrorError, MirroredBook, SyncOutcome};
pub use timetable::{ClassBlock, Timetable, TimetableError, Weekday, WeeklySlot, group_into_blocks};
pub use types::{AttendanceStatus, BlockId, CourseCode, SlotId, ValidationError};
