use crate::ipc::helpers::{finish, get_optional_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::RosterKind;
use crate::templates::import_template;
use serde_json::{json, Value};
use std::path::PathBuf;

/// `templates.importCsv {kind, outPath?}`. Works without a workspace.
fn import_csv(params: &Value) -> Result<Value, HandlerErr> {
    let raw = get_required_str(params, "kind")?;
    let template = RosterKind::from_prefix(&raw)
        .and_then(import_template)
        .ok_or_else(|| HandlerErr::bad_params(format!("no import template for {}", raw)))?;

    let mut out = json!({
        "filename": template.filename,
        "content": template.content,
    });
    if let Some(out_path) = get_optional_str(params, "outPath") {
        let path = PathBuf::from(&out_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HandlerErr::new("io_failed", e.to_string()).with_details(json!({ "path": out_path }))
            })?;
        }
        std::fs::write(&path, template.content.as_bytes()).map_err(|e| {
            HandlerErr::new("io_failed", e.to_string()).with_details(json!({ "path": out_path }))
        })?;
        out["path"] = json!(out_path);
    }
    Ok(out)
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "templates.importCsv" => Some(finish(&req.id, import_csv(&req.params))),
        _ => None,
    }
}
