use crate::error::AttendanceError;
use crate::models::{
    Attendance, AttendanceEntry, AttendanceFilter, DayRecord, MAX_NAME_LEN, MAX_ROLL_NO_LEN,
    MAX_STATUS_LEN, NewAttendance, NewStudent, Student,
};
use crate::schema;
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError, QueryResult};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// The students seeded into an empty roster on startup.
const SAMPLE_STUDENTS: [(&str, &str); 3] = [("S001", "Alice"), ("S002", "Bob"), ("S003", "Charlie")];

/// The only date format accepted from callers.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AttendanceError> {
    let invalid = || AttendanceError::validation("invalid date format, use YYYY-MM-DD");

    // chrono skips leading whitespace and allows a signed year.
    if !raw.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| invalid())
}

/// The manager for recording and retrieving students and their attendance.
pub struct AttendanceManager {
    db: SqliteConnection,
}

impl AttendanceManager {
    /// Connects to the `sqlite3` database at `database_url`, creating the file if it does not
    /// exist yet. The schema is not touched; see [`AttendanceManager::initialize`].
    pub fn connect(database_url: &str) -> Result<Self, AttendanceError> {
        let db = SqliteConnection::establish(database_url)?;
        debug!(database_url, "connected to database");

        Ok(Self { db })
    }

    /// Creates the tables if they are absent and, when `seed` is set, fills an empty roster with
    /// the sample students. Safe to run on every startup.
    pub fn initialize(&mut self, seed: bool) -> QueryResult<()> {
        self.db.batch_execute(schema::CREATE_TABLES)?;

        if seed && self.num_students()? == 0 {
            let sample: Vec<NewStudent> = SAMPLE_STUDENTS
                .iter()
                .map(|&(roll_no, name)| NewStudent { roll_no, name })
                .collect();

            let inserted = diesel::insert_into(schema::students::table)
                .values(&sample)
                .execute(&mut self.db)?;

            info!(inserted, "seeded empty roster with sample students");
        }

        Ok(())
    }

    /// Returns the total number of students on the roster.
    pub fn num_students(&mut self) -> QueryResult<usize> {
        use schema::students::dsl::*;

        students
            .count()
            .get_result(&mut self.db)
            .map(|count: i64| count as usize)
    }

    /// Retrieves all students on the roster, ordered by roll number.
    pub fn get_roster(&mut self) -> QueryResult<Vec<Student>> {
        use schema::students::dsl::*;

        students
            .order(roll_no.asc())
            .select(Student::as_select())
            .load(&mut self.db)
    }

    /// Adds a student to the roster and returns it with its assigned ID.
    ///
    /// Both fields must be non-empty, and `new_roll_no` must not already be on the roster.
    pub fn add_student(
        &mut self,
        new_roll_no: &str,
        new_name: &str,
    ) -> Result<Student, AttendanceError> {
        use schema::students::dsl::*;

        if new_roll_no.is_empty() || new_name.is_empty() {
            return Err(AttendanceError::validation("roll_no and name required"));
        }
        if new_roll_no.chars().count() > MAX_ROLL_NO_LEN {
            return Err(AttendanceError::Validation(format!(
                "roll_no must be at most {MAX_ROLL_NO_LEN} characters"
            )));
        }
        if new_name.chars().count() > MAX_NAME_LEN {
            return Err(AttendanceError::Validation(format!(
                "name must be at most {MAX_NAME_LEN} characters"
            )));
        }

        let taken: i64 = students
            .filter(roll_no.eq(new_roll_no))
            .count()
            .get_result(&mut self.db)?;
        if taken > 0 {
            return Err(roll_no_conflict());
        }

        let student = diesel::insert_into(students)
            .values(NewStudent {
                roll_no: new_roll_no,
                name: new_name,
            })
            .returning(Student::as_returning())
            .get_result(&mut self.db)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    roll_no_conflict()
                }
                other => other.into(),
            })?;

        info!(id = student.id, roll_no = %student.roll_no, "added student");
        Ok(student)
    }

    /// Returns the attendance records matching every set field of `filter`, newest date first.
    /// Records sharing a date keep their insertion order.
    pub fn get_attendance(&mut self, filter: &AttendanceFilter) -> QueryResult<Vec<Attendance>> {
        use schema::attendance::dsl::*;

        let mut query = attendance
            .order((date.desc(), id.asc()))
            .select(Attendance::as_select())
            .into_boxed();

        if let Some(day) = filter.date {
            query = query.filter(date.eq(day));
        }
        if let Some(student) = filter.student_id {
            query = query.filter(student_id.eq(student));
        }

        query.load(&mut self.db)
    }

    /// For a given day, replaces the status of every student named in `entries`. Students
    /// without a record for that day get a new one.
    ///
    /// If a student appears more than once, their last entry wins. The replacement is applied
    /// in a single transaction, so either every entry lands or the day is left untouched.
    ///
    /// Returns the number of records written.
    pub fn mark_day(
        &mut self,
        day: NaiveDate,
        entries: &[AttendanceEntry],
    ) -> Result<usize, AttendanceError> {
        if entries.is_empty() {
            return Err(AttendanceError::validation("date and entries required"));
        }

        if let Some(entry) = entries
            .iter()
            .find(|e| e.status.is_empty() || e.status.chars().count() > MAX_STATUS_LEN)
        {
            return Err(AttendanceError::Validation(format!(
                "status for student {} must be 1 to {MAX_STATUS_LEN} characters",
                entry.student_id
            )));
        }

        // Collapse repeated students onto the position of their first entry.
        let mut positions: HashMap<i32, usize> = HashMap::new();
        let mut records: Vec<NewAttendance> = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = NewAttendance {
                student_id: entry.student_id,
                date: day,
                status: &entry.status,
            };

            match positions.get(&entry.student_id) {
                Some(&pos) => {
                    warn!(student_id = entry.student_id, %day, "student listed twice, keeping the last status");
                    records[pos] = record;
                }
                None => {
                    positions.insert(entry.student_id, records.len());
                    records.push(record);
                }
            }
        }

        let written = self.replace_day(day, &records)?;

        info!(%day, written, "marked attendance");
        Ok(written)
    }

    /// Deletes the `day` records of every student in `records`, then inserts `records`, all in
    /// one transaction.
    fn replace_day(&mut self, day: NaiveDate, records: &[NewAttendance]) -> QueryResult<usize> {
        use schema::attendance::dsl::*;

        let ids: Vec<i32> = records.iter().map(|record| record.student_id).collect();

        self.db.transaction(|conn| {
            let removed = diesel::delete(attendance)
                .filter(date.eq(day))
                .filter(student_id.eq_any(&ids))
                .execute(conn)?;
            debug!(%day, removed, "cleared previous attendance");

            diesel::insert_into(attendance).values(records).execute(conn)
        })
    }

    /// Returns every record for `day` joined with its student, in insertion order.
    ///
    /// Records whose student is not on the roster are skipped.
    pub fn get_day_report(&mut self, day: NaiveDate) -> QueryResult<Vec<DayRecord>> {
        use schema::{attendance, students};

        attendance::table
            .inner_join(students::table)
            .filter(attendance::date.eq(day))
            .order(attendance::id.asc())
            .select((
                students::roll_no,
                students::name,
                attendance::date,
                attendance::status,
            ))
            .load(&mut self.db)
    }
}

fn roll_no_conflict() -> AttendanceError {
    AttendanceError::Conflict("roll_no already exists".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> AttendanceManager {
        let mut manager = AttendanceManager::connect(":memory:").expect("in-memory database");
        manager.initialize(true).expect("initialize schema");
        manager
    }

    fn day(raw: &str) -> NaiveDate {
        parse_date(raw).expect("valid date")
    }

    fn entry(student_id: i32, status: &str) -> AttendanceEntry {
        AttendanceEntry {
            student_id,
            status: status.to_string(),
        }
    }

    fn statuses(records: &[Attendance]) -> Vec<(i32, &str)> {
        records
            .iter()
            .map(|r| (r.student_id, r.status.as_str()))
            .collect()
    }

    #[test]
    fn seeds_sample_students_once() {
        let mut manager = seeded();
        manager.initialize(true).expect("second initialize");

        let roster = manager.get_roster().expect("roster");
        let roll_nos: Vec<&str> = roster.iter().map(|s| s.roll_no.as_str()).collect();
        assert_eq!(roll_nos, ["S001", "S002", "S003"]);
        assert_eq!(roster[0].name, "Alice");
    }

    #[test]
    fn seeding_can_be_disabled() {
        let mut manager = AttendanceManager::connect(":memory:").expect("in-memory database");
        manager.initialize(false).expect("initialize schema");
        assert_eq!(manager.num_students().expect("count"), 0);
    }

    #[test]
    fn roster_is_ordered_by_roll_no() {
        let mut manager = seeded();
        manager.add_student("A100", "Zed").expect("add student");

        let roster = manager.get_roster().expect("roster");
        assert_eq!(roster[0].roll_no, "A100");
        assert_eq!(roster.len(), 4);
    }

    #[test]
    fn add_student_assigns_fresh_id() {
        let mut manager = seeded();
        let dana = manager.add_student("S004", "Dana").expect("add student");

        assert_eq!(dana.id, 4);
        assert_eq!(dana.roll_no, "S004");
        assert_eq!(dana.name, "Dana");
    }

    #[test]
    fn add_student_requires_both_fields() {
        let mut manager = seeded();

        for (roll_no, name) in [("", "Dana"), ("S004", ""), ("", "")] {
            let err = manager.add_student(roll_no, name).unwrap_err();
            assert!(matches!(err, AttendanceError::Validation(ref m) if m == "roll_no and name required"));
        }
        assert_eq!(manager.num_students().unwrap(), 3);
    }

    #[test]
    fn add_student_rejects_overlong_values() {
        let mut manager = seeded();
        let long = "x".repeat(MAX_NAME_LEN + 1);

        assert!(matches!(
            manager.add_student("S004", &long),
            Err(AttendanceError::Validation(_))
        ));
        assert!(matches!(
            manager.add_student(&long, "Dana"),
            Err(AttendanceError::Validation(_))
        ));
    }

    #[test]
    fn duplicate_roll_no_conflicts_without_mutation() {
        let mut manager = seeded();
        let before = manager.get_roster().unwrap();

        let err = manager.add_student("S001", "Impostor").unwrap_err();
        assert!(matches!(err, AttendanceError::Conflict(ref m) if m == "roll_no already exists"));
        assert_eq!(manager.get_roster().unwrap(), before);
    }

    #[test]
    fn parse_date_rejects_malformed_input() {
        for raw in [
            "2024-13-40",
            "not-a-date",
            "2024/01/10",
            "",
            "2024-01-10T00:00",
            "+2024-01-10",
            " 2024-01-10",
            "-2024-01-10",
        ] {
            assert!(
                matches!(parse_date(raw), Err(AttendanceError::Validation(_))),
                "{raw} should be rejected"
            );
        }
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn marked_entries_round_trip_through_query() {
        let mut manager = seeded();
        let jan10 = day("2024-01-10");

        let written = manager
            .mark_day(jan10, &[entry(1, "Present"), entry(2, "Absent")])
            .unwrap();
        assert_eq!(written, 2);

        let filter = AttendanceFilter {
            date: Some(jan10),
            ..Default::default()
        };
        let records = manager.get_attendance(&filter).unwrap();
        assert_eq!(statuses(&records), [(1, "Present"), (2, "Absent")]);
        assert!(records.iter().all(|r| r.date == jan10));
    }

    #[test]
    fn marking_twice_is_idempotent() {
        let mut manager = seeded();
        let jan10 = day("2024-01-10");
        let entries = [entry(1, "Present"), entry(2, "Absent")];

        manager.mark_day(jan10, &entries).unwrap();
        manager.mark_day(jan10, &entries).unwrap();

        let records = manager.get_attendance(&AttendanceFilter::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(statuses(&records), [(1, "Present"), (2, "Absent")]);
    }

    #[test]
    fn marking_replaces_only_listed_students() {
        let mut manager = seeded();
        let jan10 = day("2024-01-10");

        manager
            .mark_day(jan10, &[entry(1, "Present"), entry(2, "Present")])
            .unwrap();
        manager
            .mark_day(jan10, &[entry(2, "Absent"), entry(3, "Present")])
            .unwrap();

        let mut records = manager.get_attendance(&AttendanceFilter::default()).unwrap();
        records.sort_by_key(|r| r.student_id);
        assert_eq!(
            statuses(&records),
            [(1, "Present"), (2, "Absent"), (3, "Present")]
        );
    }

    #[test]
    fn repeated_student_keeps_last_status() {
        let mut manager = seeded();
        let jan10 = day("2024-01-10");

        let written = manager
            .mark_day(jan10, &[entry(1, "Present"), entry(2, "Present"), entry(1, "Absent")])
            .unwrap();
        assert_eq!(written, 2);

        let records = manager.get_attendance(&AttendanceFilter::default()).unwrap();
        assert_eq!(statuses(&records), [(1, "Absent"), (2, "Present")]);
    }

    #[test]
    fn status_is_stored_verbatim() {
        let mut manager = seeded();
        let jan10 = day("2024-01-10");

        manager.mark_day(jan10, &[entry(1, "Late")]).unwrap();

        let records = manager.get_attendance(&AttendanceFilter::default()).unwrap();
        assert_eq!(statuses(&records), [(1, "Late")]);
    }

    #[test]
    fn invalid_marks_are_rejected_before_mutation() {
        let mut manager = seeded();
        let jan10 = day("2024-01-10");
        manager.mark_day(jan10, &[entry(1, "Present")]).unwrap();

        assert!(matches!(
            manager.mark_day(jan10, &[]),
            Err(AttendanceError::Validation(_))
        ));
        assert!(matches!(
            manager.mark_day(jan10, &[entry(1, "Absent"), entry(2, "")]),
            Err(AttendanceError::Validation(_))
        ));
        assert!(matches!(
            manager.mark_day(jan10, &[entry(1, &"x".repeat(MAX_STATUS_LEN + 1))]),
            Err(AttendanceError::Validation(_))
        ));

        let records = manager.get_attendance(&AttendanceFilter::default()).unwrap();
        assert_eq!(statuses(&records), [(1, "Present")]);
    }

    #[test]
    fn failed_replacement_leaves_day_intact() {
        let mut manager = seeded();
        let jan10 = day("2024-01-10");
        manager
            .mark_day(jan10, &[entry(1, "Present"), entry(2, "Absent")])
            .unwrap();

        // The second record violates the status CHECK constraint, so the insert fails after the
        // delete has already run.
        let overlong = "x".repeat(MAX_STATUS_LEN + 1);
        let records = [
            NewAttendance {
                student_id: 1,
                date: jan10,
                status: "Absent",
            },
            NewAttendance {
                student_id: 2,
                date: jan10,
                status: &overlong,
            },
        ];
        assert!(manager.replace_day(jan10, &records).is_err());

        let records = manager.get_attendance(&AttendanceFilter::default()).unwrap();
        assert_eq!(statuses(&records), [(1, "Present"), (2, "Absent")]);
    }

    #[test]
    fn query_filters_combine_with_and() {
        let mut manager = seeded();
        let jan10 = day("2024-01-10");
        let jan11 = day("2024-01-11");

        manager
            .mark_day(jan10, &[entry(1, "Present"), entry(2, "Absent")])
            .unwrap();
        manager
            .mark_day(jan11, &[entry(1, "Absent"), entry(3, "Present")])
            .unwrap();

        let all = manager.get_attendance(&AttendanceFilter::default()).unwrap();
        assert_eq!(all.len(), 4);
        // Newest date first, insertion order within a date.
        assert_eq!(
            all.iter().map(|r| (r.date, r.student_id)).collect::<Vec<_>>(),
            [(jan11, 1), (jan11, 3), (jan10, 1), (jan10, 2)]
        );

        for filter in [
            AttendanceFilter { date: Some(jan10), student_id: None },
            AttendanceFilter { date: None, student_id: Some(1) },
            AttendanceFilter { date: Some(jan11), student_id: Some(1) },
            AttendanceFilter { date: Some(jan11), student_id: Some(2) },
        ] {
            let expected: Vec<Attendance> = all
                .iter()
                .filter(|r| filter.date.is_none_or(|d| r.date == d))
                .filter(|r| filter.student_id.is_none_or(|s| r.student_id == s))
                .cloned()
                .collect();
            assert_eq!(manager.get_attendance(&filter).unwrap(), expected, "{filter:?}");
        }
    }

    #[test]
    fn day_report_joins_students() {
        let mut manager = seeded();
        let jan10 = day("2024-01-10");
        manager
            .mark_day(jan10, &[entry(2, "Absent"), entry(1, "Present"), entry(99, "Present")])
            .unwrap();
        manager
            .mark_day(day("2024-01-11"), &[entry(3, "Present")])
            .unwrap();

        let report = manager.get_day_report(jan10).unwrap();
        assert_eq!(
            report,
            [
                DayRecord {
                    roll_no: "S002".into(),
                    name: "Bob".into(),
                    date: jan10,
                    status: "Absent".into(),
                },
                DayRecord {
                    roll_no: "S001".into(),
                    name: "Alice".into(),
                    date: jan10,
                    status: "Present".into(),
                },
            ]
        );
    }
}
