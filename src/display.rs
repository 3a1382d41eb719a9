use crate::manager::AttendanceManager;
use chrono::NaiveDate;
use diesel::QueryResult;
use tabled::{Table, Tabled, settings::Style};

fn render<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.to_string()
}

/// Pretty prints the roster, ordered by roll number.
pub fn show_roster(manager: &mut AttendanceManager) -> QueryResult<()> {
    let roster = manager.get_roster()?;

    println!("Roster ({} students):\n{}", roster.len(), render(roster));

    Ok(())
}

/// Pretty prints the attendance recorded on a given day, joined with each student's details.
pub fn show_day_attendance(manager: &mut AttendanceManager, day: NaiveDate) -> QueryResult<()> {
    let records = manager.get_day_report(day)?;

    if records.is_empty() {
        println!("No attendance recorded on {day}.");
        return Ok(());
    }

    println!("Attendance on {day}:\n{}", render(records));

    Ok(())
}
