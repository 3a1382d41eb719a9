use std::fs::File;
use std::io;

use anyhow::{Context, Result};
use attendance_tracker::cli::{Cli, Command};
use attendance_tracker::config::Settings;
use attendance_tracker::manager::parse_date;
use attendance_tracker::{display, export, init_tracing, open_manager, start_server};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut settings = Settings::load().context("failed to load configuration")?;
    if let Some(database) = cli.database {
        settings.database.url = database;
    }

    if let Command::Serve { host, port } = cli.command {
        if let Some(host) = host {
            settings.server.host = host;
        }
        if let Some(port) = port {
            settings.server.port = port;
        }
        return start_server(settings).await;
    }

    let mut manager = open_manager(&settings)?;

    match cli.command {
        Command::Serve { .. } => unreachable!("handled above"),
        Command::Roster => display::show_roster(&mut manager)?,
        Command::AddStudent { roll_no, name } => {
            let student = manager.add_student(&roll_no, &name)?;
            println!("Added {} ({}) with id {}", student.name, student.roll_no, student.id);
        }
        Command::Mark { date, entries } => {
            let day = parse_date(&date)?;
            let written = manager.mark_day(day, &entries)?;
            println!("Saved {written} records for {day}");
        }
        Command::ShowDay { date } => {
            let day = parse_date(&date)?;
            display::show_day_attendance(&mut manager, day)?;
        }
        Command::Export { date, output } => {
            let day = parse_date(&date)?;
            let records = manager.get_day_report(day)?;

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    export::write_day_csv(&records, file)?;
                    info!(path = %path.display(), rows = records.len(), "exported attendance");
                }
                None => export::write_day_csv(&records, io::stdout().lock())?,
            }
        }
    }

    Ok(())
}
