//! Loading the semester configuration.

use std::path::Path;

use anyhow::{Context, Result};
use bunk_core::{Semester, SemesterSpec};
use figment::Figment;
use figment::providers::{Format, Toml};

/// The semester shipped with the binary.
pub const BUNDLED_SEMESTER: &str = include_str!("../data/even-2026.toml");

/// Loads the semester from `path`, or the bundled semester when `None`.
pub fn load_semester(path: Option<&Path>) -> Result<Semester> {
    let figment = match path {
        Some(path) => {
            anyhow::ensure!(
                path.is_file(),
                "semester file not found: {}",
                path.display()
            );
            Figment::from(Toml::file(path))
        }
        None => Figment::from(Toml::string(BUNDLED_SEMESTER)),
    };
    let spec: SemesterSpec = figment
        .extract()
        .context("failed to parse semester configuration")?;
    let semester = Semester::new(spec).context("invalid semester configuration")?;
    tracing::debug!(
        semester = semester.name().unwrap_or("unnamed"),
        source = path.map_or_else(|| "bundled".to_string(), |p| p.display().to_string()),
        "semester ready"
    );
    Ok(semester)
}
