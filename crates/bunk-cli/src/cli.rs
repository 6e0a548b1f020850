//! Command-line argument definitions.

use std::path::PathBuf;

use bunk_core::{AttendanceStatus, BlockId, CalendarError, parse_date_key};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};

/// Attendance tracker and bunk projector.
///
/// Tracks per-class attendance against a 75% policy and projects how many
/// classes can be missed or must be attended for each course.
#[derive(Debug, Parser)]
#[command(name = "bunk", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Mark a block as present or absent.
    Mark {
        /// Date of the class (YYYY-MM-DD).
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,

        /// Block ID (see `bunk day`).
        block: BlockId,

        /// `present` or `absent`.
        status: AttendanceStatus,
    },

    /// Remove the mark for a block.
    Clear {
        /// Date of the class (YYYY-MM-DD).
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,

        /// Block ID.
        block: BlockId,
    },

    /// Delete every attendance mark.
    Reset {
        /// Confirm the reset.
        #[arg(long)]
        yes: bool,
    },

    /// Show the blocks and marks for a date (default: today).
    Day {
        #[arg(value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show attendance statistics for all courses, or one course in detail.
    Stats {
        /// Course code, e.g. "CSE 304".
        course: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the overall bunk status.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the class in session and the next one.
    Now {
        /// Local time to use instead of now (YYYY-MM-DDTHH:MM).
        #[arg(long, value_parser = parse_datetime_arg)]
        at: Option<NaiveDateTime>,
    },

    /// Cross-check configured course hours against the calendar.
    Check,

    /// Export attendance marks as JSONL to stdout.
    Export,

    /// Import attendance marks as JSONL from stdin.
    Import,
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, CalendarError> {
    parse_date_key(value)
}

fn parse_datetime_arg(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .map_err(|e| format!("invalid time `{value}`: {e}"))
}
