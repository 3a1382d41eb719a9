use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse},
};
use serde_json::{Value, json};

use crate::error::AttendanceError;
use crate::export::{day_csv, export_filename};
use crate::extract::{
    JsonOrForm, MarkAttendancePayload, QueryParams, StudentPayload, parse_entries, parse_student_id,
};
use crate::manager::parse_date;
use crate::models::{Attendance, AttendanceFilter, Student};
use crate::state::AppState;

pub async fn index_page() -> Html<&'static str> {
    Html(include_str!("../templates/index.html"))
}

pub async fn students_page() -> Html<&'static str> {
    Html(include_str!("../templates/students.html"))
}

pub async fn attendance_page() -> Html<&'static str> {
    Html(include_str!("../templates/attendance.html"))
}

pub async fn list_students_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Student>>, AttendanceError> {
    let students = state
        .with_manager(|manager| Ok(manager.get_roster()?))
        .await?;

    Ok(Json(students))
}

pub async fn create_student_handler(
    State(state): State<AppState>,
    JsonOrForm(payload): JsonOrForm<StudentPayload>,
) -> Result<(StatusCode, Json<Student>), AttendanceError> {
    let roll_no = payload.roll_no.unwrap_or_default();
    let name = payload.name.unwrap_or_default();

    let student = state
        .with_manager(move |manager| manager.add_student(&roll_no, &name))
        .await?;

    Ok((StatusCode::CREATED, Json(student)))
}

fn attendance_filter(params: &QueryParams) -> Result<AttendanceFilter, AttendanceError> {
    let date = params.first("date").map(parse_date).transpose()?;
    let student_id = params
        .first("student_id")
        .map(parse_student_id)
        .transpose()?;

    Ok(AttendanceFilter { date, student_id })
}

pub async fn list_attendance_handler(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Json<Vec<Attendance>>, AttendanceError> {
    let filter = attendance_filter(&params)?;

    let records = state
        .with_manager(move |manager| Ok(manager.get_attendance(&filter)?))
        .await?;

    Ok(Json(records))
}

pub async fn mark_attendance_handler(
    State(state): State<AppState>,
    JsonOrForm(payload): JsonOrForm<MarkAttendancePayload>,
) -> Result<(StatusCode, Json<Value>), AttendanceError> {
    let (Some(raw_date), Some(entries)) = (non_empty(payload.date), payload.entries) else {
        return Err(AttendanceError::validation("date and entries required"));
    };

    let entries = parse_entries(entries)?;
    if entries.is_empty() {
        return Err(AttendanceError::validation("date and entries required"));
    }
    let day = parse_date(&raw_date)?;

    state
        .with_manager(move |manager| manager.mark_day(day, &entries))
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "msg": "saved" }))))
}

pub async fn export_handler(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<impl IntoResponse, AttendanceError> {
    let Some(raw_date) = params.first("date") else {
        return Err(AttendanceError::validation("date param required (YYYY-MM-DD)"));
    };
    let day = parse_date(raw_date)?;

    let records = state
        .with_manager(move |manager| Ok(manager.get_day_report(day)?))
        .await?;
    let body = day_csv(&records).map_err(|e| AttendanceError::Internal(e.to_string()))?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", export_filename(day)),
        ),
    ];

    Ok((headers, body))
}

/// Treats an empty parameter the same as a missing one.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
