//! `{kind}.list|create|update|delete|reset` for all six roster kinds.

use crate::ipc::error::err;
use crate::ipc::helpers::{finish, get_optional_str, get_required_str, parse_params, school_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::*;
use crate::roster::ListFilter;
use crate::school::{School, SchoolEntity};
use crate::stats::{roster_stats, senior_officers};
use serde_json::{json, Value};
use tracing::debug;

/// How a roster kind appears on the wire: rows carry resolved labels and
/// list responses carry whole-roster statistics.
trait RosterView: SchoolEntity {
    /// Kind-specific alias for `category` in list params.
    const CATEGORY_PARAM: Option<&'static str> = None;

    fn row(&self, school: &School) -> Value;

    fn stats(school: &School) -> Value;

    fn matches_extra(&self, _school: &School, _params: &Value) -> bool {
        true
    }
}

impl RosterView for Student {
    const CATEGORY_PARAM: Option<&'static str> = Some("classId");

    fn row(&self, school: &School) -> Value {
        let class = school.classes.get(&self.class_id);
        let mut v = json!(self);
        v["classLabel"] = json!(class.map(|c| c.label.as_str()));
        v["majorId"] = json!(class.map(|c| c.major_id.as_str()));
        v["majorName"] = json!(class.and_then(|c| school.major_name(&c.major_id)));
        v
    }

    fn stats(school: &School) -> Value {
        json!(roster_stats(school.students.all()))
    }

    fn matches_extra(&self, school: &School, params: &Value) -> bool {
        match get_optional_str(params, "majorId") {
            Some(major_id) => school.student_in_major(self, &major_id),
            None => true,
        }
    }
}

impl RosterView for Teacher {
    const CATEGORY_PARAM: Option<&'static str> = Some("subjectId");

    fn row(&self, school: &School) -> Value {
        let mut v = json!(self);
        v["subjectName"] = json!(school.subject_name(&self.subject_id));
        v
    }

    fn stats(school: &School) -> Value {
        json!(roster_stats(school.teachers.all()))
    }
}

impl RosterView for Officer {
    const CATEGORY_PARAM: Option<&'static str> = Some("department");

    fn row(&self, _school: &School) -> Value {
        json!(self)
    }

    fn stats(school: &School) -> Value {
        let mut v = json!(roster_stats(school.officers.all()));
        v["senior"] = json!(senior_officers(school.officers.all()));
        v
    }
}

impl RosterView for Class {
    const CATEGORY_PARAM: Option<&'static str> = Some("majorId");

    fn row(&self, school: &School) -> Value {
        let mut v = json!(self);
        v["majorName"] = json!(school.major_name(&self.major_id));
        v["studentCount"] = json!(school.students_in_class(&self.id));
        v
    }

    fn stats(school: &School) -> Value {
        let classes = school.classes.all();
        let mut majors: Vec<&str> = classes.iter().map(|c| c.major_id.as_str()).collect();
        majors.sort_unstable();
        majors.dedup();
        json!({ "total": classes.len(), "distinctGroups": majors.len() })
    }
}

impl RosterView for Major {
    fn row(&self, school: &School) -> Value {
        let classes = school
            .classes
            .all()
            .iter()
            .filter(|c| c.major_id == self.id)
            .count();
        let mut v = json!(self);
        v["classCount"] = json!(classes);
        v
    }

    fn stats(school: &School) -> Value {
        json!({ "total": school.majors.len() })
    }
}

impl RosterView for Subject {
    fn row(&self, school: &School) -> Value {
        let teachers = school
            .teachers
            .all()
            .iter()
            .filter(|t| t.subject_id == self.id)
            .count();
        let mut v = json!(self);
        v["teacherCount"] = json!(teachers);
        v
    }

    fn stats(school: &School) -> Value {
        json!({ "total": school.subjects.len() })
    }
}

fn handle_list<E: RosterView>(school: &School, params: &Value) -> Result<Value, HandlerErr> {
    let category = get_optional_str(params, "category")
        .or_else(|| E::CATEGORY_PARAM.and_then(|k| get_optional_str(params, k)));
    let filter = ListFilter {
        query: get_optional_str(params, "query"),
        category,
    };
    let rows: Vec<Value> = school
        .list::<E>(&filter)
        .into_iter()
        .filter(|e| e.matches_extra(school, params))
        .map(|e| e.row(school))
        .collect();
    Ok(json!({
        "filteredCount": rows.len(),
        "items": rows,
        "stats": E::stats(school),
    }))
}

fn handle_create<E: RosterView>(school: &mut School, params: &Value) -> Result<Value, HandlerErr> {
    let input: E::Input = parse_params(params)?;
    let created = school.create::<E>(&input)?;
    Ok(json!({ "item": created.row(school) }))
}

fn handle_update<E: RosterView>(school: &mut School, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let input: E::Input = parse_params(params)?;
    let updated = school.update::<E>(&id, &input)?;
    Ok(json!({ "item": updated.row(school) }))
}

fn handle_delete<E: RosterView>(school: &mut School, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let deleted = school.delete::<E>(&id)?;
    Ok(json!({ "deleted": deleted }))
}

fn handle_reset<E: RosterView>(school: &mut School) -> Result<Value, HandlerErr> {
    school.reset::<E>();
    Ok(json!({ "total": E::store(school).len() }))
}

fn dispatch<E: RosterView>(state: &mut AppState, op: &str, req: &Request) -> Option<Value> {
    if !matches!(op, "list" | "create" | "update" | "delete" | "reset") {
        return None;
    }
    debug!(method = %req.method, "roster request");
    let result = school_mut(state).and_then(|school| match op {
        "list" => handle_list::<E>(school, &req.params),
        "create" => handle_create::<E>(school, &req.params),
        "update" => handle_update::<E>(school, &req.params),
        "delete" => handle_delete::<E>(school, &req.params),
        _ => handle_reset::<E>(school),
    });
    Some(finish(&req.id, result))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let (prefix, op) = req.method.split_once('.')?;
    let kind = RosterKind::from_prefix(prefix)?;
    if op == "import" && matches!(kind, RosterKind::Students | RosterKind::Teachers) {
        return Some(err(
            &req.id,
            "not_implemented",
            format!("{} import is not available yet", kind.noun()),
            Some(json!({ "template": "templates.importCsv" })),
        ));
    }
    match kind {
        RosterKind::Students => dispatch::<Student>(state, op, req),
        RosterKind::Teachers => dispatch::<Teacher>(state, op, req),
        RosterKind::Officers => dispatch::<Officer>(state, op, req),
        RosterKind::Classes => dispatch::<Class>(state, op, req),
        RosterKind::Majors => dispatch::<Major>(state, op, req),
        RosterKind::Subjects => dispatch::<Subject>(state, op, req),
    }
}
