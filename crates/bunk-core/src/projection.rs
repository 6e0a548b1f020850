//! Attendance projection against the 75% policy.
//!
//! # Quantities
//!
//! With `held = attended + missed`, `total` the course's semester hours, `od`
//! its OD/ML allowance and `min_required` the hours needed when `od` is used in
//! full:
//!
//! - `required_for_75 = ceil(0.75 * total)`
//! - `can_bunk_without_od = max(0, total - required_for_75 - missed)`
//! - `must_attend_for_75 = max(0, required_for_75 - attended)`
//! - `can_bunk_with_od = max(0, total - min_required - missed)`
//! - `projected_best = 100 * (attended + remaining) / total`
//! - `projected_worst = 100 * attended / total`
//! - `safety_margin = attended - ceil(0.75 * held)`
//!
//! Percentages are unrounded. Every ratio with a zero denominator is 0.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::ledger::Ledger;
use crate::semester::{CourseMetadata, REQUIRED_PERCENT, Semester, ceil_percent};
use crate::timetable::{ClassBlock, Weekday};
use crate::types::{AttendanceStatus, CourseCode};

/// Attended and missed hours for one course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CourseHours {
    pub attended: i64,
    pub missed: i64,
}

impl CourseHours {
    pub const fn held(&self) -> i64 {
        self.attended + self.missed
    }

    fn add(&mut self, status: AttendanceStatus, hours: u32) {
        match status {
            AttendanceStatus::Present => self.attended += i64::from(hours),
            AttendanceStatus::Absent => self.missed += i64::from(hours),
        }
    }
}

/// Attendance band for a course's current percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBand {
    Safe,
    Warning,
    Danger,
    Critical,
}

impl StatusBand {
    /// Bands a percentage. A course with no held hours is safe.
    pub fn classify(percentage: f64, held: i64) -> Self {
        if held == 0 || percentage >= 85.0 {
            Self::Safe
        } else if percentage >= 75.0 {
            Self::Warning
        } else if percentage >= 65.0 {
            Self::Danger
        } else {
            Self::Critical
        }
    }

    /// Danger and critical courses are below the threshold.
    pub const fn is_at_risk(self) -> bool {
        matches!(self, Self::Danger | Self::Critical)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for StatusBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Full projection for one course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedCourseStats {
    pub course: CourseCode,
    pub title: String,
    pub total_hours: i64,
    pub od_ml_allowance: i64,
    pub min_required: i64,
    pub attended: i64,
    pub missed: i64,
    pub held: i64,
    /// Hours still to be held; negative if more was marked than planned.
    pub remaining: i64,
    pub current_percentage: f64,
    pub required_for_75: i64,
    pub max_bunks_allowed: i64,
    pub can_bunk_without_od: i64,
    pub must_attend_for_75: i64,
    pub max_bunks_with_od: i64,
    pub can_bunk_with_od: i64,
    pub projected_best: f64,
    pub projected_worst: f64,
    /// Hours above (positive) or below (negative) 75% of the hours held so far.
    pub safety_margin: i64,
    pub band: StatusBand,
    pub rooms: Vec<String>,
}

impl DetailedCourseStats {
    /// Derives every projection quantity from metadata and aggregated hours.
    pub fn compute(meta: &CourseMetadata, hours: CourseHours) -> Self {
        let total = i64::from(meta.total_hours);
        let od = i64::from(meta.od_ml_allowance);
        let min_required = i64::from(meta.min_required);
        let CourseHours { attended, missed } = hours;
        let held = hours.held();

        let current_percentage = percentage(attended, held);
        let required_for_75 = ceil_percent(total, REQUIRED_PERCENT);
        let max_bunks_allowed = total - required_for_75;
        let max_bunks_with_od = total - min_required;
        let remaining = total - held;

        Self {
            course: meta.course.clone(),
            title: meta.display_title().to_string(),
            total_hours: total,
            od_ml_allowance: od,
            min_required,
            attended,
            missed,
            held,
            remaining,
            current_percentage,
            required_for_75,
            max_bunks_allowed,
            can_bunk_without_od: (max_bunks_allowed - missed).max(0),
            must_attend_for_75: (required_for_75 - attended).max(0),
            max_bunks_with_od,
            can_bunk_with_od: (max_bunks_with_od - missed).max(0),
            projected_best: percentage(attended + remaining, total),
            projected_worst: percentage(attended, total),
            safety_margin: attended - ceil_percent(held, REQUIRED_PERCENT),
            band: StatusBand::classify(current_percentage, held),
            rooms: meta.rooms.clone(),
        }
    }
}

/// `100 * part / whole`, or 0 when `whole` is not positive.
#[expect(
    clippy::cast_precision_loss,
    reason = "hour counts are far below 2^52"
)]
fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    100.0 * part as f64 / whole as f64
}

/// Overall bunk status across courses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BunkStatus {
    /// No course has any marked hours yet.
    NoData,
    /// At least one course is below 75%; the worst one is reported.
    AtRisk {
        course: CourseCode,
        percentage: f64,
        must_attend: i64,
    },
    /// Every course is at or above 75%; the most constrained one is reported.
    Safe {
        course: CourseCode,
        percentage: f64,
        can_bunk: i64,
    },
}

impl BunkStatus {
    /// One-line human summary.
    pub fn message(&self) -> String {
        match self {
            Self::NoData => "Start marking attendance to see bunk status".to_string(),
            Self::AtRisk {
                course,
                must_attend,
                ..
            } => format!(
                "{course}: Attend {} to reach 75%",
                hours_label(*must_attend)
            ),
            Self::Safe {
                course, can_bunk, ..
            } if *can_bunk > 0 => {
                format!("{course}: Can bunk {}", hours_label(*can_bunk))
            }
            Self::Safe { course, .. } => {
                format!("{course}: Attend the next class to stay above 75%")
            }
        }
    }
}

/// `1 hour`, `2 hours`.
pub fn hours_label(n: i64) -> String {
    if n == 1 {
        "1 hour".to_string()
    } else {
        format!("{n} hours")
    }
}

/// Present and absent hours marked on one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateSummary {
    pub present: u32,
    pub absent: u32,
}

/// Standing of a subject based only on the hours held so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStanding {
    Safe,
    Danger,
    Neutral,
}

/// Per-subject summary over held hours, without semester totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub course: CourseCode,
    pub held: i64,
    pub attended: i64,
    pub percentage: f64,
    /// Further absences before dropping under 75% of held hours.
    pub can_bunk: i64,
    /// Consecutive attendances needed to climb back to 75%.
    pub must_attend: i64,
    pub standing: SubjectStanding,
}

impl SubjectSummary {
    fn compute(course: CourseCode, hours: CourseHours) -> Self {
        let CourseHours { attended, .. } = hours;
        let held = hours.held();
        let percentage = percentage(attended, held);
        let (can_bunk, must_attend, standing) = if held == 0 {
            (0, 0, SubjectStanding::Neutral)
        } else if 4 * attended >= 3 * held {
            // attended / (held + x) >= 0.75
            ((4 * attended - 3 * held) / 3, 0, SubjectStanding::Safe)
        } else {
            // (attended + x) / (held + x) >= 0.75
            (0, 3 * held - 4 * attended, SubjectStanding::Danger)
        };
        Self {
            course,
            held,
            attended,
            percentage,
            can_bunk,
            must_attend,
            standing,
        }
    }
}

/// Read-only projection over a semester and its ledger.
#[derive(Debug, Clone, Copy)]
pub struct Projection<'a> {
    semester: &'a Semester,
    ledger: &'a Ledger,
}

impl<'a> Projection<'a> {
    pub const fn new(semester: &'a Semester, ledger: &'a Ledger) -> Self {
        Self { semester, ledger }
    }

    /// Attended and missed hours for every course with marks.
    ///
    /// Marks dated before a course's effective start date are ignored, as are
    /// marks for block IDs that do not exist on the date's weekday.
    pub fn aggregate_all(&self) -> BTreeMap<CourseCode, CourseHours> {
        let timetable = self.semester.timetable();
        let calendar = self.semester.calendar();
        let day_blocks: BTreeMap<Weekday, Vec<ClassBlock>> = Weekday::ALL
            .into_iter()
            .map(|day| (day, timetable.blocks_for_day(day)))
            .collect();

        let mut totals: BTreeMap<CourseCode, CourseHours> = BTreeMap::new();
        for (date, records) in self.ledger.iter() {
            let Some(blocks) = Weekday::of_date(date).and_then(|day| day_blocks.get(&day)) else {
                continue;
            };
            for block in blocks {
                let Some(status) = records.get(&block.block_id) else {
                    continue;
                };
                if date < calendar.course_start_date(block.course.as_str()) {
                    continue;
                }
                totals
                    .entry(block.course.clone())
                    .or_default()
                    .add(*status, block.duration_hours);
            }
        }
        totals
    }

    /// Attended and missed hours for one course; zero if it has no marks.
    pub fn aggregate(&self, course: &str) -> CourseHours {
        self.aggregate_all().get(course).copied().unwrap_or_default()
    }

    /// Detailed projection for one course, or `None` if it has no metadata.
    pub fn course_stats(&self, course: &str) -> Option<DetailedCourseStats> {
        let meta = self.semester.course(course)?;
        Some(DetailedCourseStats::compute(meta, self.aggregate(course)))
    }

    /// Detailed projections for every course with metadata, by course code.
    pub fn all_course_stats(&self) -> Vec<DetailedCourseStats> {
        let totals = self.aggregate_all();
        self.semester
            .courses()
            .map(|meta| {
                let hours = totals.get(&meta.course).copied().unwrap_or_default();
                DetailedCourseStats::compute(meta, hours)
            })
            .collect()
    }

    /// The overall bunk status, driven by the weakest course.
    pub fn worst_course_status(&self) -> BunkStatus {
        let with_data: Vec<DetailedCourseStats> = self
            .all_course_stats()
            .into_iter()
            .filter(|stats| stats.held > 0)
            .collect();

        let lowest = with_data
            .iter()
            .filter(|stats| stats.band.is_at_risk())
            .reduce(|worst, stats| {
                if stats.current_percentage < worst.current_percentage {
                    stats
                } else {
                    worst
                }
            });
        if let Some(stats) = lowest {
            return BunkStatus::AtRisk {
                course: stats.course.clone(),
                percentage: stats.current_percentage,
                must_attend: stats.must_attend_for_75,
            };
        }

        let tightest = with_data.iter().reduce(|tightest, stats| {
            if stats.can_bunk_without_od < tightest.can_bunk_without_od {
                stats
            } else {
                tightest
            }
        });
        tightest.map_or(BunkStatus::NoData, |stats| BunkStatus::Safe {
            course: stats.course.clone(),
            percentage: stats.current_percentage,
            can_bunk: stats.can_bunk_without_od,
        })
    }

    /// Present and absent hours marked on `date`.
    pub fn date_summary(&self, date: NaiveDate) -> DateSummary {
        let blocks = self.semester.timetable().blocks_for_date(date);
        let records = self.ledger.records_for_date(date);
        let mut summary = DateSummary::default();
        for block in blocks {
            match records.get(&block.block_id) {
                Some(AttendanceStatus::Present) => summary.present += block.duration_hours,
                Some(AttendanceStatus::Absent) => summary.absent += block.duration_hours,
                None => {}
            }
        }
        summary
    }

    /// Held-hours summaries for every course in the timetable.
    pub fn subject_summaries(&self) -> Vec<SubjectSummary> {
        let totals = self.aggregate_all();
        self.semester
            .timetable()
            .courses()
            .into_iter()
            .map(|course| {
                let hours = totals.get(&course).copied().unwrap_or_default();
                SubjectSummary::compute(course, hours)
            })
            .collect()
    }
}
