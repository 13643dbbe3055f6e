use crate::attendance::{parse_hhmm, AttendanceError, AttendeeKind};
use crate::error::StoreError;
use crate::ipc::error::err;
use crate::ipc::types::AppState;
use crate::school::School;
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    /// A `validation_failed` error for one field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code: "validation_failed",
            details: Some(json!([{ "field": field, "message": message }])),
            message,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        let code = e.code();
        let message = e.to_string();
        let details = match &e {
            StoreError::Validation(v) => json!(v.errors),
            StoreError::NotFound { kind, id } => json!({ "kind": kind, "id": id }),
            StoreError::InUse { kind, id, by } => json!({ "kind": kind, "id": id, "by": by }),
        };
        Self {
            code,
            message,
            details: Some(details),
        }
    }
}

impl From<AttendanceError> for HandlerErr {
    fn from(e: AttendanceError) -> Self {
        let code = match e {
            AttendanceError::UnknownAttendee(_) => "not_found",
            AttendanceError::CheckOutNotTracked => "bad_params",
            AttendanceError::NotCheckedIn(_) | AttendanceError::CheckOutBeforeCheckIn { .. } => {
                "validation_failed"
            }
        };
        Self::new(code, e.to_string())
    }
}

pub fn finish(id: &str, result: Result<Value, HandlerErr>) -> Value {
    match result {
        Ok(v) => crate::ipc::error::ok(id, v),
        Err(e) => e.response(id),
    }
}

pub fn school_mut(state: &mut AppState) -> Result<&mut School, HandlerErr> {
    state
        .school
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T, HandlerErr> {
    let value = if params.is_null() { json!({}) } else { params.clone() };
    serde_json::from_value(value).map_err(|e| HandlerErr::bad_params(e.to_string()))
}

pub fn get_date(params: &Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    let Some(raw) = get_optional_str(params, key) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key)))
}

/// `HH:MM` from params, or the current local time to the minute.
pub fn get_time_or_now(params: &Value, key: &str) -> Result<NaiveTime, HandlerErr> {
    match get_optional_str(params, key) {
        Some(raw) => parse_hhmm(&raw).ok_or_else(|| HandlerErr::bad_params(format!("{} must be HH:MM", key))),
        None => {
            let now = chrono::Local::now().time();
            Ok(NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(now))
        }
    }
}

pub fn get_attendee_kind(params: &Value) -> Result<AttendeeKind, HandlerErr> {
    match get_optional_str(params, "kind").as_deref() {
        None | Some("student") | Some("students") => Ok(AttendeeKind::Student),
        Some("teacher") | Some("teachers") => Ok(AttendeeKind::Teacher),
        Some(other) => Err(HandlerErr::bad_params(format!("unknown kind: {}", other))),
    }
}
