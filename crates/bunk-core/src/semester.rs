//! Semester configuration: the immutable reference data the engine runs on.
//!
//! A [`SemesterSpec`] is the deserialized form (usually a TOML file); a
//! [`Semester`] is the validated object built from it. Nothing here is global,
//! so several semesters can be loaded side by side.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{Calendar, CalendarError, ExamPeriod};
use crate::timetable::{Timetable, TimetableError, WeeklySlot, Weekday};
use crate::types::{CourseCode, ValidationError};

/// Share of a course's total hours granted as OD/ML relaxation.
pub const OD_ML_PERCENT: i64 = 15;

/// Share of the post-OD hours a student must attend when using the full allowance.
pub const OD_ML_ATTENDANCE_PERCENT: i64 = 60;

/// The attendance threshold, as a percentage.
pub const REQUIRED_PERCENT: i64 = 75;

/// `ceil(value * percent / 100)` using integer arithmetic.
pub(crate) const fn ceil_percent(value: i64, percent: i64) -> i64 {
    (value * percent + 99).div_euclid(100)
}

/// Semester configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemesterError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Timetable(#[from] TimetableError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// OD/ML allowance larger than the course itself.
    #[error("course {course}: OD/ML allowance {allowance} exceeds total hours {total}")]
    AllowanceExceedsTotal {
        course: String,
        allowance: u32,
        total: u32,
    },
}

/// A holiday entry in the semester file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidaySpec {
    pub date: NaiveDate,
    pub name: String,
}

/// Per-course entry in the semester file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSpec {
    pub total_hours: u32,
    /// Defaults to 15% of `total_hours`, rounded up.
    #[serde(default)]
    pub od_ml_allowance: Option<u32>,
    /// Defaults to 60% of the hours left after OD/ML, rounded up.
    #[serde(default)]
    pub min_required: Option<u32>,
    #[serde(default)]
    pub rooms: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub faculty: Option<String>,
}

/// Deserialized semester configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Reject marks dated before a course's effective start.
    #[serde(default)]
    pub enforce_course_start: bool,
    #[serde(default)]
    pub holidays: Vec<HolidaySpec>,
    #[serde(default)]
    pub exam_periods: Vec<ExamPeriod>,
    /// Late-registration start dates per course code.
    #[serde(default)]
    pub course_start: BTreeMap<String, NaiveDate>,
    #[serde(default)]
    pub courses: BTreeMap<String, CourseSpec>,
    #[serde(default)]
    pub slots: Vec<WeeklySlot>,
}

/// Static per-course policy data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseMetadata {
    pub course: CourseCode,
    pub total_hours: u32,
    pub od_ml_allowance: u32,
    /// Hours needed when the full OD/ML allowance is used.
    pub min_required: u32,
    pub rooms: Vec<String>,
    pub title: Option<String>,
    pub faculty: Option<String>,
}

impl CourseMetadata {
    /// Metadata with the default OD/ML allowance and minimum for `total_hours`.
    pub fn with_defaults(course: CourseCode, total_hours: u32) -> Self {
        let od_ml_allowance = default_od_ml_allowance(total_hours);
        Self {
            course,
            total_hours,
            od_ml_allowance,
            min_required: default_min_required(total_hours, od_ml_allowance),
            rooms: Vec::new(),
            title: None,
            faculty: None,
        }
    }

    fn from_spec(course: CourseCode, spec: CourseSpec) -> Result<Self, SemesterError> {
        let od_ml_allowance = spec
            .od_ml_allowance
            .unwrap_or_else(|| default_od_ml_allowance(spec.total_hours));
        if od_ml_allowance > spec.total_hours {
            return Err(SemesterError::AllowanceExceedsTotal {
                course: course.to_string(),
                allowance: od_ml_allowance,
                total: spec.total_hours,
            });
        }
        let min_required = spec
            .min_required
            .unwrap_or_else(|| default_min_required(spec.total_hours, od_ml_allowance));
        Ok(Self {
            course,
            total_hours: spec.total_hours,
            od_ml_allowance,
            min_required,
            rooms: spec.rooms,
            title: spec.title,
            faculty: spec.faculty,
        })
    }

    /// Display name: the title if known, otherwise the course code.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or_else(|| self.course.as_str())
    }
}

fn default_od_ml_allowance(total_hours: u32) -> u32 {
    clamp_hours(ceil_percent(i64::from(total_hours), OD_ML_PERCENT))
}

fn default_min_required(total_hours: u32, od_ml_allowance: u32) -> u32 {
    let after_od = i64::from(total_hours) - i64::from(od_ml_allowance);
    clamp_hours(ceil_percent(after_od, OD_ML_ATTENDANCE_PERCENT))
}

fn clamp_hours(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// A validated semester: calendar, timetable and course metadata.
#[derive(Debug, Clone)]
pub struct Semester {
    name: Option<String>,
    calendar: Calendar,
    timetable: Timetable,
    courses: BTreeMap<CourseCode, CourseMetadata>,
    enforce_course_start: bool,
}

impl Semester {
    /// Validates a [`SemesterSpec`] and builds the semester.
    pub fn new(spec: SemesterSpec) -> Result<Self, SemesterError> {
        let mut calendar = Calendar::new(spec.start, spec.end)?;
        for holiday in spec.holidays {
            calendar = calendar.with_holiday(holiday.date, holiday.name);
        }
        for period in spec.exam_periods {
            calendar = calendar.with_exam_period(period)?;
        }
        for (course, date) in spec.course_start {
            calendar = calendar.with_course_start(CourseCode::new(course)?, date);
        }

        let timetable = Timetable::new(spec.slots)?;

        let mut courses = BTreeMap::new();
        for (code, course_spec) in spec.courses {
            let code = CourseCode::new(code)?;
            let metadata = CourseMetadata::from_spec(code.clone(), course_spec)?;
            courses.insert(code, metadata);
        }

        for course in timetable.courses() {
            if !courses.contains_key(&course) {
                tracing::warn!(%course, "course has slots but no metadata; stats will be skipped");
            }
        }

        tracing::debug!(
            name = spec.name.as_deref().unwrap_or("unnamed"),
            courses = courses.len(),
            slots = timetable.slots().len(),
            "semester loaded"
        );

        Ok(Self {
            name: spec.name,
            calendar,
            timetable,
            courses,
            enforce_course_start: spec.enforce_course_start,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub const fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub const fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    pub const fn enforce_course_start(&self) -> bool {
        self.enforce_course_start
    }

    /// Metadata for a course, or `None` for unknown courses.
    pub fn course(&self, course: &str) -> Option<&CourseMetadata> {
        self.courses.get(course)
    }

    pub fn courses(&self) -> impl Iterator<Item = &CourseMetadata> {
        self.courses.values()
    }

    /// Hours a course is scheduled for between its effective start and the
    /// semester end, skipping holidays, weekends and exam periods.
    pub fn scheduled_hours(&self, course: &str) -> u32 {
        let from = self.calendar.course_start_date(course);
        let weekly: BTreeMap<_, u32> = self
            .timetable
            .all_blocks_for_course(course)
            .into_iter()
            .fold(BTreeMap::new(), |mut acc, (day, block)| {
                *acc.entry(day).or_default() += block.duration_hours;
                acc
            });
        self.calendar
            .teaching_days(from, self.calendar.end())
            .filter_map(Weekday::of_date)
            .map(|day| weekly.get(&day).copied().unwrap_or(0))
            .sum()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A one-week-plus semester used across the crate's tests.
    ///
    /// Semester: Mon 2026-01-05 .. Fri 2026-01-16, holiday Wed 2026-01-14.
    /// - CSE 304: Mon 10-11 (block_mon2, 2h), Wed 13 (block_wed1, 1h)
    /// - CSE 455: Mon 12 (block_mon4, 1h)
    /// - FLC 120: Fri 9-10 (block_fri1, 2h), starts 2026-01-09
    pub(crate) fn sample_spec() -> SemesterSpec {
        serde_json::from_value(serde_json::json!({
            "name": "Test Semester",
            "start": "2026-01-05",
            "end": "2026-01-16",
            "holidays": [{ "date": "2026-01-14", "name": "Bhogi" }],
            "course_start": { "FLC 120": "2026-01-09" },
            "courses": {
                "CSE 304": { "total_hours": 45, "rooms": ["C707"] },
                "CSE 455": { "total_hours": 76, "od_ml_allowance": 12 },
                "FLC 120": { "total_hours": 44 }
            },
            "slots": [
                { "id": "mon2", "weekday": "monday", "start_hour": 10, "course": "CSE 304", "room": "C707" },
                { "id": "mon3", "weekday": "monday", "start_hour": 11, "course": "CSE 304", "room": "C707" },
                { "id": "mon4", "weekday": "monday", "start_hour": 12, "course": "CSE 455", "room": "S412", "is_lab": true },
                { "id": "wed1", "weekday": "wednesday", "start_hour": 13, "course": "CSE 304", "room": "C707" },
                { "id": "fri1", "weekday": "friday", "start_hour": 9, "course": "FLC 120", "room": "S411" },
                { "id": "fri2", "weekday": "friday", "start_hour": 10, "course": "FLC 120", "room": "S411" }
            ]
        }))
        .unwrap()
    }

    pub(crate) fn sample_semester() -> Semester {
        Semester::new(sample_spec()).unwrap()
    }

    #[test]
    fn ceil_percent_matches_exact_ceiling() {
        assert_eq!(ceil_percent(45, REQUIRED_PERCENT), 34);
        assert_eq!(ceil_percent(40, REQUIRED_PERCENT), 30);
        assert_eq!(ceil_percent(0, REQUIRED_PERCENT), 0);
        assert_eq!(ceil_percent(30, OD_ML_PERCENT), 5);
    }

    #[test]
    fn default_allowances_follow_policy() {
        let meta = CourseMetadata::with_defaults(CourseCode::new("LBA 253").unwrap(), 45);
        assert_eq!(meta.od_ml_allowance, 7);
        assert_eq!(meta.min_required, 23);

        let meta = CourseMetadata::with_defaults(CourseCode::new("CSE 423").unwrap(), 30);
        assert_eq!(meta.od_ml_allowance, 5);
        assert_eq!(meta.min_required, 15);
    }

    #[test]
    fn explicit_allowance_overrides_default() {
        let semester = sample_semester();
        let meta = semester.course("CSE 455").unwrap();
        assert_eq!(meta.od_ml_allowance, 12);
        assert_eq!(meta.min_required, 39);
        assert!(semester.course("CSE 999").is_none());
    }

    #[test]
    fn allowance_larger_than_total_is_rejected() {
        let mut spec = sample_spec();
        spec.courses.insert(
            "CSE 423".to_string(),
            CourseSpec {
                total_hours: 4,
                od_ml_allowance: Some(5),
                ..CourseSpec::default()
            },
        );
        assert!(matches!(
            Semester::new(spec),
            Err(SemesterError::AllowanceExceedsTotal { .. })
        ));
    }

    #[test]
    fn unknown_weekday_fails_to_deserialize() {
        let result: Result<WeeklySlot, _> = serde_json::from_value(serde_json::json!({
            "id": "sat1", "weekday": "saturday", "start_hour": 9, "course": "X", "room": "R"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn scheduled_hours_respect_calendar_and_course_start() {
        let semester = sample_semester();
        // Mondays 5th and 12th (2h each) plus Wednesday 7th (14th is a holiday).
        assert_eq!(semester.scheduled_hours("CSE 304"), 5);
        // Starts Friday 9th: Fridays 9th and 16th.
        assert_eq!(semester.scheduled_hours("FLC 120"), 4);
        assert_eq!(semester.scheduled_hours("CSE 999"), 0);
    }
}
