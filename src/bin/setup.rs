//! Initializes the attendance database.
//!
//! Creates the tables in the configured database if they are missing, seeds the sample students
//! into an empty roster (unless disabled in `config.toml`), and prints the resulting roster.

use anyhow::{Context, Result};
use attendance_tracker::config::Settings;
use attendance_tracker::{display, init_tracing, open_manager};
use tracing::info;

pub fn main() -> Result<()> {
    init_tracing();

    let settings = Settings::load().context("failed to load configuration")?;
    let mut manager = open_manager(&settings)?;
    info!(database = %settings.database.url, "database ready");

    display::show_roster(&mut manager)?;

    Ok(())
}
