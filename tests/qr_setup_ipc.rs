use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_edutrackd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn edutrackd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value.pointer("/error/code").and_then(|v| v.as_str())
}

#[test]
fn qr_generate_follows_qr_settings() {
    let workspace = temp_dir("edutrack-qr-setup");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let initial = request_ok(&mut stdin, &mut reader, "2", "setup.get", json!({}));
    assert_eq!(
        initial.pointer("/attendance/studentCheckIn").and_then(|v| v.as_str()),
        Some("07:10")
    );
    assert_eq!(initial.pointer("/qr/size").and_then(|v| v.as_u64()), Some(250));

    let qr = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "qr.generate",
        json!({ "classLabel": "xii rpl 1", "date": "2025-09-30" }),
    );
    assert_eq!(qr.get("token").and_then(|v| v.as_str()), Some("XII RPL 1-2025-09-30"));
    assert_eq!(
        qr.get("url").and_then(|v| v.as_str()),
        Some("https://api.qrserver.com/v1/create-qr-code/?size=250x250&data=XII%20RPL%201-2025-09-30&bgcolor=f5f5f5&color=a052de&qzone=1")
    );
    assert_eq!(
        qr.get("filename").and_then(|v| v.as_str()),
        Some("QR_Absensi_XII RPL 1_30-09-2025.png")
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "setup.update",
        json!({ "section": "qr", "patch": { "size": 300, "color": "#112233" } }),
    );
    let again = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "qr.generate",
        json!({ "classId": "class-1", "date": "2025-09-30", "regenerate": true }),
    );
    assert_eq!(again.get("token"), qr.get("token"));
    let url = again.get("url").and_then(|v| v.as_str()).expect("url");
    assert!(url.contains("size=300x300"));
    assert!(url.contains("color=112233"));
    assert!(url.contains("&t="));

    let missing = request(&mut stdin, &mut reader, "6", "qr.generate", json!({}));
    assert_eq!(error_code(&missing), Some("validation_failed"));
    let unknown = request(
        &mut stdin,
        &mut reader,
        "7",
        "qr.generate",
        json!({ "classLabel": "XIII ZZZ" }),
    );
    assert_eq!(error_code(&unknown), Some("not_found"));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn attendance_settings_apply_to_new_sessions_and_persist() {
    let workspace = temp_dir("edutrack-setup-attendance");
    {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );

        let rejected = request(
            &mut stdin,
            &mut reader,
            "2",
            "setup.update",
            json!({ "section": "attendance", "patch": { "studentCheckIn": "late" } }),
        );
        assert_eq!(error_code(&rejected), Some("bad_params"));
        let unknown = request(
            &mut stdin,
            &mut reader,
            "3",
            "setup.update",
            json!({ "section": "printer", "patch": {} }),
        );
        assert_eq!(error_code(&unknown), Some("bad_params"));

        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "4",
            "setup.update",
            json!({ "section": "attendance", "patch": { "studentCheckIn": "06:45" } }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "5",
            "attendance.open",
            json!({ "kind": "student", "date": "2025-10-01" }),
        );
        let list = request_ok(
            &mut stdin,
            &mut reader,
            "6",
            "attendance.list",
            json!({ "kind": "student" }),
        );
        assert_eq!(
            list.pointer("/records/0/checkIn").and_then(|v| v.as_str()),
            Some("06:45")
        );
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let setup = request_ok(&mut stdin, &mut reader, "8", "setup.get", json!({}));
    assert_eq!(
        setup.pointer("/attendance/studentCheckIn").and_then(|v| v.as_str()),
        Some("06:45")
    );
    let list = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "attendance.list",
        json!({ "kind": "student" }),
    );
    assert_eq!(
        list.pointer("/records/0/checkIn").and_then(|v| v.as_str()),
        Some("06:45")
    );

    let _ = std::fs::remove_dir_all(workspace);
}
