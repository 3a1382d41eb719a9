//! This module contains the command-line interface [`Cli`] parser for running the attendance
//! server and managing records from a terminal.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::AttendanceError;
use crate::extract::parse_student_id;
use crate::models::AttendanceEntry;

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Path of the SQLite database, overriding `config.toml` and `DATABASE_URL`.
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// The different commands available for managing student attendance records.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the web interface and JSON API.
    Serve {
        /// Address to bind, overriding the configured host.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overriding the configured port.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Display every student on the roster.
    Roster,

    /// Add a new student to the roster.
    AddStudent { roll_no: String, name: String },

    /// Mark attendance for a date, e.g. `mark 2024-01-10 1=Present 2=Absent`.
    Mark {
        date: String,
        #[arg(required = true, value_parser = parse_entry)]
        entries: Vec<AttendanceEntry>,
    },

    /// Display the attendance recorded on a date.
    ShowDay { date: String },

    /// Export the attendance of a date as CSV.
    Export {
        date: String,

        /// File to write instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Parses a `STUDENT_ID=STATUS` pair.
fn parse_entry(raw: &str) -> Result<AttendanceEntry, AttendanceError> {
    let (student_id, status) = raw
        .split_once('=')
        .ok_or_else(|| AttendanceError::Validation(format!("expected STUDENT_ID=STATUS, got `{raw}`")))?;

    Ok(AttendanceEntry {
        student_id: parse_student_id(student_id)?,
        status: status.to_string(),
    })
}
