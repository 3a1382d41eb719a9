//! CSV rendering of a day's attendance.

use std::io::Write;

use chrono::NaiveDate;

use crate::models::DayRecord;

/// The header row of every export.
pub const HEADER: [&str; 4] = ["roll_no", "name", "date", "status"];

/// The attachment name browsers should save the export of `day` as.
pub fn export_filename(day: NaiveDate) -> String {
    format!("attendance_{day}.csv")
}

/// Writes the header followed by one row per record, in the given order.
pub fn write_day_csv<W: Write>(records: &[DayRecord], writer: W) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(HEADER)?;
    for record in records {
        let date = record.date.to_string();
        csv_writer.write_record([
            record.roll_no.as_str(),
            record.name.as_str(),
            date.as_str(),
            record.status.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Renders the export of a day into a string.
pub fn day_csv(records: &[DayRecord]) -> csv::Result<String> {
    let mut buffer = Vec::new();
    write_day_csv(records, &mut buffer)?;

    // The writer only ever receives `&str` fields.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(roll_no: &str, name: &str, status: &str) -> DayRecord {
        DayRecord {
            roll_no: roll_no.into(),
            name: name.into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            status: status.into(),
        }
    }

    #[test]
    fn empty_day_is_header_only() {
        let csv = day_csv(&[]).unwrap();
        assert_eq!(csv.lines().collect::<Vec<_>>(), ["roll_no,name,date,status"]);
    }

    #[test]
    fn rows_follow_header_in_order() {
        let csv = day_csv(&[record("S002", "Bob", "Absent"), record("S001", "Alice", "Present")])
            .unwrap();

        assert_eq!(
            csv.lines().collect::<Vec<_>>(),
            [
                "roll_no,name,date,status",
                "S002,Bob,2024-01-10,Absent",
                "S001,Alice,2024-01-10,Present",
            ]
        );
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let csv = day_csv(&[record("S010", "Doe, Jane", "Present")]).unwrap();
        assert!(csv.contains("S010,\"Doe, Jane\",2024-01-10,Present"));
    }

    #[test]
    fn filename_embeds_date() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(export_filename(day), "attendance_2024-01-10.csv");
    }
}
