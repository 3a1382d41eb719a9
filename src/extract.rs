//! Request parsing shared by the handlers. Every rejection surfaces as an
//! [`AttendanceError::Validation`].

use axum::{
    Form, Json, async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::AttendanceError;
use crate::models::AttendanceEntry;

/// Accepts either a JSON body or an `application/x-www-form-urlencoded` body.
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + 'static,
{
    type Rejection = AttendanceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(payload) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| AttendanceError::Validation(rejection.body_text()))?;
            return Ok(Self(payload));
        }

        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AttendanceError::Validation(rejection.body_text()))?;
        Ok(Self(payload))
    }
}

/// The raw query string pairs, in order. A repeated parameter resolves to its first value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// The first value of `key`, treating an empty value as absent.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = AttendanceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AttendanceError::Validation(rejection.body_text()))?;
        Ok(Self(pairs))
    }
}

#[derive(Debug, Deserialize)]
pub struct StudentPayload {
    pub roll_no: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkAttendancePayload {
    pub date: Option<String>,
    #[serde(default)]
    pub entries: Option<Value>,
}

/// Decodes `entries`, which is a list in JSON bodies and a JSON-encoded string in form bodies.
pub fn parse_entries(entries: Value) -> Result<Vec<AttendanceEntry>, AttendanceError> {
    let items: Vec<Value> = match entries {
        Value::Array(items) => items,
        Value::String(raw) if raw.trim().is_empty() => Vec::new(),
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|_| AttendanceError::validation("entries must be a JSON list"))?,
        _ => return Err(AttendanceError::validation("entries must be a list")),
    };

    items
        .into_iter()
        .map(|item| -> Result<AttendanceEntry, AttendanceError> {
            serde_json::from_value::<EntryPayload>(item)
                .map_err(|_| AttendanceError::validation("each entry needs student_id and status"))?
                .into_entry()
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct EntryPayload {
    pub student_id: StudentRef,
    pub status: String,
}

impl EntryPayload {
    fn into_entry(self) -> Result<AttendanceEntry, AttendanceError> {
        Ok(AttendanceEntry {
            student_id: self.student_id.resolve()?,
            status: self.status,
        })
    }
}

/// A student ID given either as a number or as a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StudentRef {
    Id(i32),
    Text(String),
}

impl StudentRef {
    pub fn resolve(self) -> Result<i32, AttendanceError> {
        match self {
            StudentRef::Id(id) => Ok(id),
            StudentRef::Text(raw) => parse_student_id(&raw),
        }
    }
}

pub fn parse_student_id(raw: &str) -> Result<i32, AttendanceError> {
    raw.trim()
        .parse()
        .map_err(|_| AttendanceError::validation("invalid student_id, expected an integer"))
}
