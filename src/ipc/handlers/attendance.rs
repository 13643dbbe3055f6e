use crate::attendance::{
    AttendanceRecord, AttendanceStatus, AttendanceStore, AttendanceSummary, AttendeeKind,
    InitialMarking,
};
use crate::ipc::helpers::{
    finish, get_attendee_kind, get_date, get_optional_str, get_required_str, get_time_or_now,
    school_mut, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::qr;
use crate::school::School;
use serde_json::{json, Value};
use tracing::info;

fn session_json(session: &AttendanceStore) -> Value {
    json!({
        "kind": session.kind(),
        "date": session.date().format("%Y-%m-%d").to_string(),
        "marking": session.marking(),
    })
}

/// Record plus the display label and whether the edit form offers a note.
fn record_json(rec: &AttendanceRecord) -> Value {
    let mut v = json!(rec);
    v["statusLabel"] = json!(rec.status_label());
    v["takesNote"] = json!(rec.status.is_some_and(AttendanceStatus::takes_note));
    v
}

fn attendance_open(school: &mut School, params: &Value) -> Result<Value, HandlerErr> {
    let kind = get_attendee_kind(params)?;
    let date = get_date(params, "date")?.unwrap_or_else(|| chrono::Local::now().date_naive());
    let marking = match get_optional_str(params, "marking").as_deref() {
        None | Some("present") => InitialMarking::Present,
        Some("unmarked") => InitialMarking::Unmarked,
        Some(other) => return Err(HandlerErr::bad_params(format!("unknown marking: {}", other))),
    };
    school.open_attendance(kind, date, marking);
    let session = school.attendance(kind);
    info!(?kind, %date, ?marking, records = session.records().len(), "attendance session opened");
    let mut out = session_json(session);
    out["summary"] = json!(session.summarize());
    Ok(out)
}

fn attendance_list(school: &mut School, params: &Value) -> Result<Value, HandlerErr> {
    let kind = get_attendee_kind(params)?;
    let class_id = get_optional_str(params, "classId");
    let query = get_optional_str(params, "query").unwrap_or_default();
    let session = school.attendance(kind);
    let records = match class_id.as_deref() {
        Some(c) => session.scoped(Some(c), &query),
        None => session.filter(&query),
    };
    let mut out = session_json(session);
    out["filteredCount"] = json!(records.len());
    out["records"] = Value::Array(records.into_iter().map(record_json).collect());
    out["summary"] = json!(session.summarize());
    Ok(out)
}

fn attendance_set_status(school: &mut School, params: &Value) -> Result<Value, HandlerErr> {
    let kind = get_attendee_kind(params)?;
    let id = get_required_str(params, "id")?;
    let raw = get_required_str(params, "status")?;
    let status = AttendanceStatus::parse(&raw)
        .ok_or_else(|| HandlerErr::field("status", format!("status tidak dikenal: {}", raw)))?;
    let note = get_optional_str(params, "note");
    let rec = school.attendance(kind).set_status(&id, status, note.as_deref())?;
    Ok(json!({ "record": record_json(rec) }))
}

fn attendance_check_in(school: &mut School, params: &Value) -> Result<Value, HandlerErr> {
    let kind = get_attendee_kind(params)?;
    let id = get_required_str(params, "id")?;
    let at = get_time_or_now(params, "time")?;
    let rec = school.attendance(kind).check_in(&id, at)?;
    Ok(json!({ "record": record_json(rec) }))
}

fn attendance_check_out(school: &mut School, params: &Value) -> Result<Value, HandlerErr> {
    let kind = get_attendee_kind(params)?;
    let id = get_required_str(params, "id")?;
    let at = get_time_or_now(params, "time")?;
    let rec = school.attendance(kind).check_out(&id, at)?;
    Ok(json!({ "record": record_json(rec) }))
}

fn attendance_summary(school: &mut School, params: &Value) -> Result<Value, HandlerErr> {
    let kind = get_attendee_kind(params)?;
    let class_id = get_optional_str(params, "classId");
    let session = school.attendance(kind);
    let summary = match class_id.as_deref() {
        Some(c) => AttendanceSummary::of(session.scoped(Some(c), "")),
        None => session.summarize(),
    };
    let mut out = session_json(session);
    out["summary"] = json!(summary);
    Ok(out)
}

/// Check-in through a scanned class token. Students must belong to the
/// token's class; teachers only need a token for the session date.
fn attendance_scan(school: &mut School, params: &Value) -> Result<Value, HandlerErr> {
    let token = get_required_str(params, "token")?;
    let (label, date) =
        qr::parse_token(&token).map_err(|e| HandlerErr::field("token", e.to_string()))?;
    let class = school
        .class_by_label(&label)
        .ok_or_else(|| {
            HandlerErr::new("not_found", format!("class not found: {}", label))
                .with_details(json!({ "classLabel": label }))
        })?
        .clone();
    let at = get_time_or_now(params, "time")?;

    let (kind, id) = match get_optional_str(params, "role").as_deref() {
        None | Some("student") => (AttendeeKind::Student, get_required_str(params, "studentId")?),
        Some("teacher") => (AttendeeKind::Teacher, get_required_str(params, "teacherId")?),
        Some(other) => return Err(HandlerErr::bad_params(format!("unknown role: {}", other))),
    };

    let session_date = school.attendance(kind).date();
    if date != session_date {
        return Err(HandlerErr::field("token", "QR code tidak berlaku untuk hari ini"));
    }
    if kind == AttendeeKind::Student {
        let student = school.students.get(&id).ok_or_else(|| {
            HandlerErr::new("not_found", format!("student not found: {}", id))
        })?;
        if student.class_id != class.id {
            return Err(HandlerErr::field("token", "QR code bukan untuk kelas Anda"));
        }
    }

    let rec = school.attendance(kind).check_in(&id, at)?;
    info!(?kind, id = %id, class = %class.label, "scan check-in");
    Ok(json!({
        "classId": class.id,
        "classLabel": class.label,
        "record": record_json(rec),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let handler: fn(&mut School, &Value) -> Result<Value, HandlerErr> = match req.method.as_str() {
        "attendance.open" => attendance_open,
        "attendance.list" => attendance_list,
        "attendance.setStatus" => attendance_set_status,
        "attendance.checkIn" => attendance_check_in,
        "attendance.checkOut" => attendance_check_out,
        "attendance.summary" => attendance_summary,
        "attendance.scan" => attendance_scan,
        _ => return None,
    };
    let result = school_mut(state).and_then(|school| handler(school, &req.params));
    Some(finish(&req.id, result))
}
