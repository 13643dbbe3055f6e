use crate::attendance::{parse_hhmm, AttendanceDefaults, PresentTimes};
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::qr::QrRenderSettings;
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use tracing::info;

#[derive(Clone, Copy)]
enum SetupSection {
    Attendance,
    Qr,
}

impl SetupSection {
    const ALL: [SetupSection; 2] = [Self::Attendance, Self::Qr];

    fn parse(s: &str) -> Option<Self> {
        match s {
            "attendance" => Some(Self::Attendance),
            "qr" => Some(Self::Qr),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Attendance => "attendance",
            Self::Qr => "qr",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Attendance => "setup.attendance",
            Self::Qr => "setup.qr",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Attendance => json!({
            "studentCheckIn": "07:10",
            "teacherCheckIn": "07:00",
            "teacherCheckOut": "15:30"
        }),
        SetupSection::Qr => {
            let d = QrRenderSettings::default();
            json!({
                "renderBaseUrl": d.base_url,
                "size": d.size,
                "bgColor": d.bg_color,
                "color": d.color,
                "quietZone": d.quiet_zone
            })
        }
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_time(v: &Value, key: &str) -> Result<String, String> {
    let s = parse_string_max(v, key, 5)?;
    let t = parse_hhmm(&s).ok_or_else(|| format!("{} must be HH:MM", key))?;
    Ok(t.format("%H:%M").to_string())
}

fn parse_hex_color(v: &Value, key: &str) -> Result<String, String> {
    let s = parse_string_max(v, key, 7)?;
    let s = s.trim_start_matches('#').to_ascii_lowercase();
    if s.len() != 6 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("{} must be a 6-digit hex colour", key));
    }
    Ok(s)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::Attendance => match k.as_str() {
                "studentCheckIn" | "teacherCheckIn" | "teacherCheckOut" => {
                    obj.insert(k.clone(), Value::String(parse_time(v, k)?));
                }
                _ => return Err(format!("unknown attendance field: {}", k)),
            },
            SetupSection::Qr => match k.as_str() {
                "renderBaseUrl" => {
                    let s = parse_string_max(v, k, 200)?;
                    if !s.starts_with("https://") && !s.starts_with("http://") {
                        return Err("renderBaseUrl must be an http(s) URL".into());
                    }
                    obj.insert(k.clone(), Value::String(s));
                }
                "size" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 100, 1000)?));
                }
                "bgColor" | "color" => {
                    obj.insert(k.clone(), Value::String(parse_hex_color(v, k)?));
                }
                "quietZone" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 10)?));
                }
                _ => return Err(format!("unknown qr field: {}", k)),
            },
        }
    }

    if let SetupSection::Attendance = section {
        let check_in = obj.get("teacherCheckIn").and_then(Value::as_str).and_then(parse_hhmm);
        let check_out = obj.get("teacherCheckOut").and_then(Value::as_str).and_then(parse_hhmm);
        if let (Some(i), Some(o)) = (check_in, check_out) {
            if o < i {
                return Err("teacherCheckOut must not be before teacherCheckIn".into());
            }
        }
    }
    Ok(())
}

fn load_section(conn: &Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Malformed saved values fall back to defaults.
            let _ = merge_section_patch(section, &mut current, saved_obj);
        }
    }
    Ok(current)
}

fn time_field(section: &Value, key: &str) -> anyhow::Result<chrono::NaiveTime> {
    section
        .get(key)
        .and_then(Value::as_str)
        .and_then(parse_hhmm)
        .ok_or_else(|| anyhow::anyhow!("attendance.{} is not a time", key))
}

pub(crate) fn load_attendance_defaults(conn: &Connection) -> anyhow::Result<AttendanceDefaults> {
    let s = load_section(conn, SetupSection::Attendance)?;
    Ok(AttendanceDefaults {
        student: PresentTimes {
            check_in: time_field(&s, "studentCheckIn")?,
            check_out: None,
        },
        teacher: PresentTimes {
            check_in: time_field(&s, "teacherCheckIn")?,
            check_out: Some(time_field(&s, "teacherCheckOut")?),
        },
    })
}

pub(crate) fn load_qr_settings(conn: &Connection) -> anyhow::Result<QrRenderSettings> {
    let s = load_section(conn, SetupSection::Qr)?;
    let d = QrRenderSettings::default();
    let str_or = |key: &str, fallback: String| {
        s.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(fallback)
    };
    let u32_or = |key: &str, fallback: u32| {
        s.get(key)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(fallback)
    };
    Ok(QrRenderSettings {
        base_url: str_or("renderBaseUrl", d.base_url),
        size: u32_or("size", d.size),
        bg_color: str_or("bgColor", d.bg_color),
        color: str_or("color", d.color),
        quiet_zone: u32_or("quietZone", d.quiet_zone),
    })
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let mut out = Map::new();
    for section in SetupSection::ALL {
        match load_section(conn, section) {
            Ok(v) => {
                out.insert(section.name().to_string(), v);
            }
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        }
    }
    ok(&req.id, Value::Object(out))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }

    if let SetupSection::Attendance = section {
        let defaults = match load_attendance_defaults(conn) {
            Ok(d) => d,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        };
        if let Some(school) = state.school.as_mut() {
            school.set_attendance_defaults(defaults);
        }
    }
    info!(section = section.name(), "settings updated");
    ok(
        &req.id,
        json!({ "ok": true, "section": section.name(), "values": current }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn attendance_patch_normalizes_times() {
        let mut cur = default_section(SetupSection::Attendance);
        merge_section_patch(
            SetupSection::Attendance,
            &mut cur,
            &patch(json!({ "studentCheckIn": "6:45" })),
        )
        .expect("merge");
        assert_eq!(cur["studentCheckIn"], "06:45");
    }

    #[test]
    fn teacher_check_out_before_check_in_is_rejected() {
        let mut cur = default_section(SetupSection::Attendance);
        let res = merge_section_patch(
            SetupSection::Attendance,
            &mut cur,
            &patch(json!({ "teacherCheckOut": "06:00" })),
        );
        assert!(res.is_err());
    }

    #[test]
    fn qr_patch_validates_fields() {
        let mut cur = default_section(SetupSection::Qr);
        merge_section_patch(
            SetupSection::Qr,
            &mut cur,
            &patch(json!({ "color": "#00AA11", "size": 300 })),
        )
        .expect("merge");
        assert_eq!(cur["color"], "00aa11");
        assert_eq!(cur["size"], 300);

        for bad in [
            json!({ "size": 5 }),
            json!({ "bgColor": "white" }),
            json!({ "renderBaseUrl": "ftp://x" }),
            json!({ "unknown": 1 }),
        ] {
            let mut cur = default_section(SetupSection::Qr);
            assert!(merge_section_patch(SetupSection::Qr, &mut cur, &patch(bad)).is_err());
        }
    }
}
