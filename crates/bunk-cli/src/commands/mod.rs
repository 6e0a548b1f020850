//! CLI subcommand implementations.

pub mod check;
pub mod day;
pub mod export;
pub mod import;
pub mod mark;
pub mod now;
pub mod stats;
pub mod status;
pub mod util;
