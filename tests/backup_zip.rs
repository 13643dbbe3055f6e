#[path = "../src/backup.rs"]
mod backup;

use serde_json::json;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
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

fn sqlite_bytes(payload: &[u8]) -> Vec<u8> {
    let mut bytes = b"SQLite format 3\0".to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    serde_json::from_str(line.trim()).expect("parse response json")
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

#[test]
fn zip_export_and_import_roundtrip() {
    let workspace = temp_dir("edutrack-backup-src");
    let workspace2 = temp_dir("edutrack-backup-dst");
    let out_dir = temp_dir("edutrack-backup-out");

    let db_src = workspace.join("edutrack.sqlite3");
    let bytes = sqlite_bytes(b"sqlite-test-payload");
    std::fs::write(&db_src, &bytes).expect("write source db");

    let bundle_path = out_dir.join("workspace.edutrack.zip");
    let export = backup::export_workspace_bundle(&workspace, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 3);
    assert_eq!(export.db_sha256.len(), 64);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    assert!(manifest.contains(backup::BUNDLE_FORMAT_V1));
    assert!(manifest.contains(&export.db_sha256));
    archive
        .by_name("db/edutrack.sqlite3")
        .expect("database entry in bundle");
    archive
        .by_name("meta/workspace.json")
        .expect("workspace metadata entry");

    let source = backup::read_backup(&bundle_path).expect("read bundle");
    assert_eq!(source.format, backup::BUNDLE_FORMAT_V1);
    backup::install_database(&workspace2, &source).expect("install database");
    assert!(!workspace2.join("edutrack.sqlite3.importing").exists());

    let restored = std::fs::read(workspace2.join("edutrack.sqlite3")).expect("read restored db");
    assert_eq!(restored, bytes);

    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(workspace2);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn tampered_database_entry_is_rejected() {
    let out_dir = temp_dir("edutrack-backup-tampered");
    let workspace = temp_dir("edutrack-backup-tampered-dst");

    let bundle_path = out_dir.join("tampered.zip");
    {
        let f = File::create(&bundle_path).expect("create bundle");
        let mut zip = zip::ZipWriter::new(f);
        let opts = zip::write::FileOptions::default();
        zip.start_file("manifest.json", opts).expect("manifest");
        zip.write_all(
            json!({ "format": backup::BUNDLE_FORMAT_V1, "dbSha256": "00" })
                .to_string()
                .as_bytes(),
        )
        .expect("write manifest");
        zip.start_file("db/edutrack.sqlite3", opts).expect("db");
        zip.write_all(&sqlite_bytes(b"not the exported bytes")).expect("write db");
        zip.finish().expect("finish");
    }

    let err = backup::read_backup(&bundle_path).expect_err("checksum");
    assert!(err.to_string().contains("checksum"));
    assert!(!workspace.join("edutrack.sqlite3").exists());

    let _ = std::fs::remove_dir_all(out_dir);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn plain_sqlite_import_is_supported() {
    let out_dir = temp_dir("edutrack-backup-plain");
    let workspace = temp_dir("edutrack-backup-plain-dst");

    let plain = out_dir.join("copy.sqlite3");
    let bytes = sqlite_bytes(b"plain-sqlite-copy");
    std::fs::write(&plain, &bytes).expect("write sqlite file");

    let source = backup::read_backup(&plain).expect("read sqlite");
    assert_eq!(source.format, backup::PLAIN_SQLITE_FORMAT);
    backup::install_database(&workspace, &source).expect("install sqlite");

    let restored = std::fs::read(workspace.join("edutrack.sqlite3")).expect("read restored sqlite");
    assert_eq!(restored, bytes);

    let _ = std::fs::remove_dir_all(out_dir);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn bundle_import_over_ipc_restores_rosters() {
    let workspace = temp_dir("edutrack-backup-ipc");
    let bundle = workspace.join("snapshot.zip");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "majors.create",
        json!({ "name": "Akuntansi" }),
    );
    let export = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "backup.exportWorkspaceBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(
        export.get("bundleFormat").and_then(|v| v.as_str()),
        Some("edutrack-workspace-v1")
    );

    let _ = request_ok(&mut stdin, &mut reader, "4", "majors.reset", json!({}));
    let after_reset = request_ok(&mut stdin, &mut reader, "5", "majors.list", json!({}));
    assert_eq!(after_reset.pointer("/stats/total").and_then(|v| v.as_u64()), Some(3));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "backup.importWorkspaceBundle",
        json!({ "inPath": bundle.to_string_lossy() }),
    );
    let restored = request_ok(&mut stdin, &mut reader, "7", "majors.list", json!({}));
    assert_eq!(restored.pointer("/stats/total").and_then(|v| v.as_u64()), Some(4));
    assert_eq!(
        restored.pointer("/items/0/name").and_then(|v| v.as_str()),
        Some("Akuntansi")
    );

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn files_that_are_not_databases_are_rejected_before_writing() {
    let out_dir = temp_dir("edutrack-backup-reject");
    let workspace = temp_dir("edutrack-backup-reject-dst");
    let existing = sqlite_bytes(b"current workspace");
    std::fs::write(workspace.join("edutrack.sqlite3"), &existing).expect("write current db");

    let notes = out_dir.join("notes.txt");
    std::fs::write(&notes, "catatan rapat guru").expect("write notes");
    let err = backup::read_backup(&notes).expect_err("plain text");
    assert!(err.to_string().contains("not a SQLite database"));

    let broken_zip = out_dir.join("broken.zip");
    std::fs::write(&broken_zip, b"PK\x03\x04garbage").expect("write broken zip");
    let err = backup::read_backup(&broken_zip).expect_err("broken zip");
    assert!(format!("{err:#}").contains("invalid zip archive"));

    let still = std::fs::read(workspace.join("edutrack.sqlite3")).expect("read current db");
    assert_eq!(still, existing);
    assert!(!workspace.join("edutrack.sqlite3.importing").exists());

    let _ = std::fs::remove_dir_all(out_dir);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn failed_import_over_ipc_keeps_workspace_open() {
    let workspace = temp_dir("edutrack-backup-ipc-fail");
    let notes = workspace.join("notes.txt");
    let broken_zip = workspace.join("broken.zip");
    std::fs::write(&notes, "bukan database").expect("write notes");
    std::fs::write(&broken_zip, b"PK\x03\x04garbage").expect("write broken zip");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "majors.create",
        json!({ "name": "Tata Boga" }),
    );

    for (id, path) in [("3", &notes), ("4", &broken_zip)] {
        let resp = request(
            &mut stdin,
            &mut reader,
            id,
            "backup.importWorkspaceBundle",
            json!({ "inPath": path.to_string_lossy() }),
        );
        assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(
            resp.pointer("/error/code").and_then(|v| v.as_str()),
            Some("io_failed")
        );
    }

    let majors = request_ok(&mut stdin, &mut reader, "5", "majors.list", json!({}));
    assert_eq!(majors.pointer("/stats/total").and_then(|v| v.as_u64()), Some(4));

    drop(stdin);
    let (_child2, mut stdin2, mut reader2) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin2,
        &mut reader2,
        "6",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let reopened = request_ok(&mut stdin2, &mut reader2, "7", "majors.list", json!({}));
    assert_eq!(reopened.pointer("/stats/total").and_then(|v| v.as_u64()), Some(4));

    let _ = std::fs::remove_dir_all(workspace);
}
