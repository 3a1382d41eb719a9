diesel::table! {
    attendance (id) {
        id -> Integer,
        student_id -> Integer,
        date -> Date,
        status -> Text,
    }
}

diesel::table! {
    students (id) {
        id -> Integer,
        roll_no -> Text,
        name -> Text,
    }
}

diesel::joinable!(attendance -> students (student_id));

diesel::allow_tables_to_appear_in_same_query!(attendance, students);

/// DDL for both tables. Every statement is idempotent so it can run on each startup.
pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    roll_no VARCHAR(64) NOT NULL UNIQUE,
    name VARCHAR(128) NOT NULL
);

CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    student_id INTEGER NOT NULL REFERENCES students (id),
    date DATE NOT NULL,
    status VARCHAR(16) NOT NULL CHECK (length(status) BETWEEN 1 AND 16)
);

CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance (date);
";
