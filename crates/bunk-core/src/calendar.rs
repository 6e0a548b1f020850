//! Academic calendar: classifies dates into teaching and non-teaching days.
//!
//! Classification follows a fixed precedence (first match wins):
//!
//! 1. before the semester start
//! 2. after the semester end
//! 3. listed holiday
//! 4. Saturday or Sunday
//! 5. inside an exam period (inclusive on both ends)
//! 6. teaching day
//!
//! A weekend that falls inside an exam period is therefore reported as a
//! weekend, and a holiday on a weekday is reported as a holiday.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CourseCode;

/// Format of every date key handled by the tracker.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Calendar configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// A date string was not a valid `YYYY-MM-DD` calendar date.
    #[error("invalid date `{value}`: expected YYYY-MM-DD")]
    InvalidDate { value: String },

    /// The semester ends before it starts.
    #[error("semester end {end} is before semester start {start}")]
    InvertedSemester { start: NaiveDate, end: NaiveDate },

    /// An exam period ends before it starts.
    #[error("exam period `{name}` ends ({end}) before it starts ({start})")]
    InvertedExamPeriod {
        name: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Parses a strict `YYYY-MM-DD` date key.
///
/// Rejects anything chrono would otherwise be lenient about (single-digit
/// months, padding spaces, signed years, trailing text).
pub fn parse_date_key(value: &str) -> Result<NaiveDate, CalendarError> {
    let invalid = || CalendarError::InvalidDate {
        value: value.to_string(),
    };
    let well_formed = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_KEY_FORMAT).map_err(|_| invalid())
}

/// Formats a date as its `YYYY-MM-DD` key.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// A named, inclusive range of days on which classes are cancelled for exams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamPeriod {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ExamPeriod {
    /// Returns true if `date` lies within the period, inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The teaching status of a single calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalendarFact {
    BeforeSemester,
    AfterSemester,
    Weekend { day: Weekday },
    Holiday { name: String },
    ExamBlackout { name: String },
    TeachingDay,
}

impl CalendarFact {
    /// Returns true if classes are scheduled on this date.
    pub const fn is_teaching_day(&self) -> bool {
        matches!(self, Self::TeachingDay)
    }
}

impl fmt::Display for CalendarFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeSemester => write!(f, "before semester start"),
            Self::AfterSemester => write!(f, "after semester end"),
            Self::Weekend { day } => {
                let name = if *day == Weekday::Sat {
                    "Saturday"
                } else {
                    "Sunday"
                };
                write!(f, "{name} - no classes")
            }
            Self::Holiday { name } => write!(f, "holiday: {name}"),
            Self::ExamBlackout { name } => write!(f, "exams: {name}"),
            Self::TeachingDay => write!(f, "teaching day"),
        }
    }
}

/// Semester boundaries plus the holiday, exam and late-start tables.
#[derive(Debug, Clone)]
pub struct Calendar {
    start: NaiveDate,
    end: NaiveDate,
    holidays: BTreeMap<NaiveDate, String>,
    exam_periods: Vec<ExamPeriod>,
    course_start: HashMap<CourseCode, NaiveDate>,
}

impl Calendar {
    /// Creates a calendar with no holidays, exams or course overrides.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CalendarError> {
        if end < start {
            return Err(CalendarError::InvertedSemester { start, end });
        }
        Ok(Self {
            start,
            end,
            holidays: BTreeMap::new(),
            exam_periods: Vec::new(),
            course_start: HashMap::new(),
        })
    }

    /// Adds a holiday. A later entry for the same date replaces the earlier one.
    #[must_use]
    pub fn with_holiday(mut self, date: NaiveDate, name: impl Into<String>) -> Self {
        self.holidays.insert(date, name.into());
        self
    }

    /// Adds an exam period.
    pub fn with_exam_period(mut self, period: ExamPeriod) -> Result<Self, CalendarError> {
        if period.end < period.start {
            return Err(CalendarError::InvertedExamPeriod {
                name: period.name,
                start: period.start,
                end: period.end,
            });
        }
        self.exam_periods.push(period);
        Ok(self)
    }

    /// Overrides the date a course starts counting attendance (late registration).
    #[must_use]
    pub fn with_course_start(mut self, course: CourseCode, date: NaiveDate) -> Self {
        self.course_start.insert(course, date);
        self
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn holidays(&self) -> impl Iterator<Item = (NaiveDate, &str)> {
        self.holidays.iter().map(|(date, name)| (*date, name.as_str()))
    }

    pub fn exam_periods(&self) -> &[ExamPeriod] {
        &self.exam_periods
    }

    /// Classifies a date. See the [module documentation](self) for precedence.
    pub fn classify(&self, date: NaiveDate) -> CalendarFact {
        if date < self.start {
            return CalendarFact::BeforeSemester;
        }
        if date > self.end {
            return CalendarFact::AfterSemester;
        }
        if let Some(name) = self.holidays.get(&date) {
            return CalendarFact::Holiday { name: name.clone() };
        }
        let day = date.weekday();
        if matches!(day, Weekday::Sat | Weekday::Sun) {
            return CalendarFact::Weekend { day };
        }
        if let Some(period) = self.exam_periods.iter().find(|p| p.contains(date)) {
            return CalendarFact::ExamBlackout {
                name: period.name.clone(),
            };
        }
        CalendarFact::TeachingDay
    }

    /// Parses and classifies a date key, failing fast on malformed input.
    pub fn classify_key(&self, key: &str) -> Result<CalendarFact, CalendarError> {
        parse_date_key(key).map(|date| self.classify(date))
    }

    /// Returns the date a course starts counting attendance.
    ///
    /// Falls back to the semester start for courses without an override.
    pub fn course_start_date(&self, course: &str) -> NaiveDate {
        self.course_start
            .get(course)
            .copied()
            .unwrap_or(self.start)
    }

    /// Iterates the teaching days in `from..=to`, clipped to the semester.
    pub fn teaching_days(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
        let from = from.max(self.start);
        let to = to.min(self.end);
        from.iter_days()
            .take_while(move |date| *date <= to)
            .filter(|date| self.classify(*date).is_teaching_day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date_key(s).unwrap()
    }

    fn calendar() -> Calendar {
        Calendar::new(date("2026-01-05"), date("2026-05-04"))
            .unwrap()
            .with_holiday(date("2026-01-26"), "Republic Day")
            .with_exam_period(ExamPeriod {
                name: "Mid-Term Exams".to_string(),
                start: date("2026-03-07"),
                end: date("2026-03-13"),
            })
            .unwrap()
            .with_course_start(CourseCode::new("FLC 120").unwrap(), date("2026-01-30"))
    }

    #[test]
    fn parse_date_key_is_strict() {
        assert!(parse_date_key("2026-01-05").is_ok());
        assert!(parse_date_key("2026-1-5").is_err());
        assert!(parse_date_key("2026-02-30").is_err());
        assert!(parse_date_key(" 2026-01-05").is_err());
        assert!(parse_date_key("yesterday").is_err());
        for padded in [
            "2026- 1-05",
            "2026-01- 5",
            "+026-01-05",
            "-026-01-05",
            " 026-01-05",
            "2026/01/05",
        ] {
            assert!(parse_date_key(padded).is_err(), "{padded:?} should be rejected");
        }
    }

    #[test]
    fn classify_semester_bounds() {
        let cal = calendar();
        assert_eq!(cal.classify(date("2026-01-04")), CalendarFact::BeforeSemester);
        assert_eq!(cal.classify(date("2026-05-05")), CalendarFact::AfterSemester);
        assert_eq!(cal.classify(date("2026-01-05")), CalendarFact::TeachingDay);
        assert_eq!(cal.classify(date("2026-05-04")), CalendarFact::TeachingDay);
    }

    #[test]
    fn classify_holiday_before_weekday() {
        assert_eq!(
            calendar().classify(date("2026-01-26")),
            CalendarFact::Holiday {
                name: "Republic Day".to_string()
            }
        );
    }

    #[test]
    fn classify_weekend() {
        assert_eq!(
            calendar().classify(date("2026-01-10")),
            CalendarFact::Weekend { day: Weekday::Sat }
        );
        assert_eq!(
            calendar().classify(date("2026-01-11")),
            CalendarFact::Weekend { day: Weekday::Sun }
        );
    }

    #[test]
    fn weekend_inside_exam_period_is_weekend() {
        // 2026-03-07 is a Saturday and the first day of the exam period.
        assert_eq!(
            calendar().classify(date("2026-03-07")),
            CalendarFact::Weekend { day: Weekday::Sat }
        );
    }

    #[test]
    fn exam_period_is_inclusive() {
        let cal = calendar();
        for key in ["2026-03-09", "2026-03-13"] {
            assert_eq!(
                cal.classify(date(key)),
                CalendarFact::ExamBlackout {
                    name: "Mid-Term Exams".to_string()
                }
            );
        }
        assert_eq!(cal.classify(date("2026-03-16")), CalendarFact::TeachingDay);
    }

    #[test]
    fn holiday_on_weekend_is_reported_as_holiday() {
        let cal = Calendar::new(date("2026-01-05"), date("2026-05-04"))
            .unwrap()
            .with_holiday(date("2026-01-10"), "Festival");
        assert_eq!(
            cal.classify(date("2026-01-10")),
            CalendarFact::Holiday {
                name: "Festival".to_string()
            }
        );
    }

    #[test]
    fn empty_tables_classify_weekdays_as_teaching() {
        let cal = Calendar::new(date("2026-01-05"), date("2026-01-09")).unwrap();
        assert_eq!(cal.teaching_days(cal.start(), cal.end()).count(), 5);
    }

    #[test]
    fn classify_key_fails_fast() {
        assert_eq!(
            calendar().classify_key("2026-13-01"),
            Err(CalendarError::InvalidDate {
                value: "2026-13-01".to_string()
            })
        );
    }

    #[test]
    fn course_start_date_uses_override() {
        let cal = calendar();
        assert_eq!(cal.course_start_date("FLC 120"), date("2026-01-30"));
        assert_eq!(cal.course_start_date("CSE 304"), date("2026-01-05"));
    }

    #[test]
    fn rejects_inverted_ranges() {
        assert!(Calendar::new(date("2026-05-04"), date("2026-01-05")).is_err());
        let inverted = ExamPeriod {
            name: "Backwards".to_string(),
            start: date("2026-03-13"),
            end: date("2026-03-09"),
        };
        assert!(calendar().with_exam_period(inverted).is_err());
    }

    #[test]
    fn teaching_days_skip_holidays_weekends_and_exams() {
        let cal = calendar();
        // Week of Jan 26: Monday is a holiday.
        let days: Vec<_> = cal
            .teaching_days(date("2026-01-26"), date("2026-02-01"))
            .collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], date("2026-01-27"));
        // Exam week has no teaching days.
        assert_eq!(
            cal.teaching_days(date("2026-03-07"), date("2026-03-15"))
                .count(),
            0
        );
    }
}
