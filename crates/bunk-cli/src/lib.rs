//! Attendance tracker CLI library.
//!
//! This crate provides the CLI interface for the attendance tracker.

mod cli;
pub mod commands;
mod config;
pub mod semester;

pub use cli::{Cli, Commands};
pub use config::Config;
