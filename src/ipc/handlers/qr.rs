use crate::ipc::handlers::setup;
use crate::ipc::helpers::{finish, get_date, get_optional_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::qr;
use serde_json::{json, Value};

/// `qr.generate {classId | classLabel, date?, regenerate?}`. The token only
/// depends on class and date; `regenerate` changes the render URL alone.
fn qr_generate(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let (Some(conn), Some(school)) = (state.db.as_ref(), state.school.as_ref()) else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    let class = match (
        get_optional_str(params, "classId"),
        get_optional_str(params, "classLabel"),
    ) {
        (Some(id), _) => school.classes.get(&id),
        (None, Some(label)) => school.class_by_label(&label),
        (None, None) => return Err(HandlerErr::field("classId", "Kelas harus dipilih")),
    }
    .ok_or_else(|| HandlerErr::new("not_found", "class not found"))?;

    let date = get_date(params, "date")?.unwrap_or_else(|| chrono::Local::now().date_naive());
    let regenerate = params
        .get("regenerate")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let settings = setup::load_qr_settings(conn)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;

    let token = qr::generate_token(&class.label, date);
    let cache_bust = regenerate.then(|| chrono::Utc::now().timestamp_millis());
    Ok(json!({
        "classId": class.id,
        "classLabel": class.label,
        "date": date.format("%Y-%m-%d").to_string(),
        "token": token,
        "url": qr::render_url(&settings, &token, cache_bust),
        "filename": qr::download_filename(&class.label, date),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "qr.generate" => Some(finish(&req.id, qr_generate(state, &req.params))),
        _ => None,
    }
}
