use crate::schema::{attendance, students};
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::Serialize;
use tabled::Tabled;

/// The longest `roll_no` the `students` table accepts.
pub const MAX_ROLL_NO_LEN: usize = 64;
/// The longest `name` the `students` table accepts.
pub const MAX_NAME_LEN: usize = 128;
/// The longest `status` the `attendance` table accepts.
pub const MAX_STATUS_LEN: usize = 16;

#[derive(Queryable, Selectable, Serialize, Tabled, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    pub id: i32,
    pub roll_no: String,
    pub name: String,
}

#[derive(Insertable)]
#[diesel(table_name = students)]
pub struct NewStudent<'a> {
    pub roll_no: &'a str,
    pub name: &'a str,
}

/// A single attendance record. `status` is `Present` or `Absent` by convention only.
#[derive(Queryable, Selectable, Serialize, Tabled, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = attendance)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Attendance {
    pub id: i32,
    pub student_id: i32,
    pub date: NaiveDate,
    pub status: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = attendance)]
pub struct NewAttendance<'a> {
    pub student_id: i32,
    pub date: NaiveDate,
    pub status: &'a str,
}

/// One student's status as submitted for a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
    pub student_id: i32,
    pub status: String,
}

/// An attendance record joined with the student it belongs to, in export column order.
#[derive(Queryable, Serialize, Tabled, Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    pub roll_no: String,
    pub name: String,
    pub date: NaiveDate,
    pub status: String,
}

/// Optional filters for [`crate::manager::AttendanceManager::get_attendance`]. Unset fields
/// do not constrain the result.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub date: Option<NaiveDate>,
    pub student_id: Option<i32>,
}
