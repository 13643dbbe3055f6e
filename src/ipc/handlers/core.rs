use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup;
use crate::ipc::types::{AppState, Request};
use crate::repo::SqliteSnapshots;
use crate::school::School;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{info, warn};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

/// Opens the workspace database and loads every roster from it. Used by
/// `workspace.select` and after a backup import.
pub(crate) fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    state.close_workspace();
    let conn = Rc::new(db::open_db(path)?);
    let defaults = match setup::load_attendance_defaults(&conn) {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, "attendance settings unreadable, using defaults");
            Default::default()
        }
    };
    let today = chrono::Local::now().date_naive();
    let school = School::open(SqliteSnapshots::new(Rc::clone(&conn)), today, defaults);
    info!(workspace = %path.display(), %today, "workspace opened");

    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.school = Some(school);
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, &path) {
        Ok(()) => ok(&req.id, json!({ "workspacePath": path.to_string_lossy() })),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
