use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bunk_cli::commands::{check, day, export, import, mark, now, stats, status, util};
use bunk_cli::semester::load_semester;
use bunk_cli::{Cli, Commands, Config};
use bunk_core::{AttendanceBook, MirroredBook, Semester};
use bunk_db::Database;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

/// Load the configured semester.
fn open_semester(config: &Config) -> Result<Semester> {
    load_semester(config.semester_path.as_deref())
}

/// Open the database and rebuild the attendance book from it.
fn open_book(config_path: Option<&Path>) -> Result<(AttendanceBook, Database)> {
    let (db, config) = open_database(config_path)?;
    let book = util::load_book(&db, open_semester(&config)?)?;
    Ok((book, db))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config_path = cli.config.as_deref();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Mark {
            date,
            block,
            status,
        }) => {
            let (book, db) = open_book(config_path)?;
            let mut book = MirroredBook::new(book, db);
            mark::mark(&mut out, &mut book, *date, block, *status)?;
        }
        Some(Commands::Clear { date, block }) => {
            let (book, db) = open_book(config_path)?;
            let mut book = MirroredBook::new(book, db);
            mark::clear(&mut out, &mut book, *date, block)?;
        }
        Some(Commands::Reset { yes }) => {
            let (book, db) = open_book(config_path)?;
            let mut book = MirroredBook::new(book, db);
            mark::reset(&mut out, &mut book, *yes)?;
        }
        Some(Commands::Day { date, json }) => {
            let (book, _db) = open_book(config_path)?;
            let date = date.unwrap_or_else(util::today);
            day::run(&mut out, &book, date, *json)?;
        }
        Some(Commands::Stats { course, json }) => {
            let (book, _db) = open_book(config_path)?;
            stats::run(&mut out, &book, course.as_deref(), *json)?;
        }
        Some(Commands::Status { json }) => {
            let (book, _db) = open_book(config_path)?;
            status::run(&mut out, &book, *json)?;
        }
        Some(Commands::Now { at }) => {
            // Now only needs the timetable, not the database
            let config = Config::load_from(config_path).context("failed to load configuration")?;
            let semester = open_semester(&config)?;
            let at = at.unwrap_or_else(|| chrono::Local::now().naive_local());
            now::run(&mut out, &semester, at)?;
        }
        Some(Commands::Check) => {
            let config = Config::load_from(config_path).context("failed to load configuration")?;
            let semester = open_semester(&config)?;
            check::run(&mut out, &semester)?;
        }
        Some(Commands::Export) => {
            let (db, _config) = open_database(config_path)?;
            let mut writer = BufWriter::new(&mut out);
            let written = export::run(&mut writer, &db)?;
            writer.flush().context("failed to flush export")?;
            tracing::debug!(written, "exported attendance");
        }
        Some(Commands::Import) => {
            let (book, mut db) = open_book(config_path)?;
            let summary = import::run(io::stdin().lock(), &book, &mut db)?;
            writeln!(
                out,
                "Imported {} marks ({} skipped)",
                summary.applied, summary.skipped
            )?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(out)?;
        }
    }

    Ok(())
}
