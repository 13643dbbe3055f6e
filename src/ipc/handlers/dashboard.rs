use crate::ipc::helpers::{finish, school_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::school::School;
use crate::stats::{roster_stats, senior_officers};
use serde_json::{json, Value};

fn dashboard_summary(school: &mut School) -> Result<Value, HandlerErr> {
    let overview = school.overview();
    let mut out = json!(overview);
    out["students"] = json!(roster_stats(school.students.all()));
    out["teachers"] = json!(roster_stats(school.teachers.all()));
    let mut officers = json!(roster_stats(school.officers.all()));
    officers["senior"] = json!(senior_officers(school.officers.all()));
    out["officers"] = officers;
    Ok(out)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "dashboard.summary" => {
            let result = school_mut(state).and_then(dashboard_summary);
            Some(finish(&req.id, result))
        }
        _ => None,
    }
}
