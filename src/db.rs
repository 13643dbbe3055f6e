use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "edutrack.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots(
            key TEXT PRIMARY KEY,
            json TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            json TEXT NOT NULL
        )",
        [],
    )?;

    // Early workspaces were created before snapshots carried a timestamp.
    ensure_snapshots_updated_at(&conn)?;

    Ok(conn)
}

pub fn snapshot_get(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT json FROM snapshots WHERE key = ?", [key], |r| {
        r.get::<_, String>(0)
    })
    .optional()
}

pub fn snapshot_put(conn: &Connection, key: &str, json: &str) -> rusqlite::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO snapshots(key, json, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET json = excluded.json, updated_at = excluded.updated_at",
        (key, json, now),
    )?;
    Ok(())
}

pub fn snapshot_delete(conn: &Connection, key: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM snapshots WHERE key = ?", [key])?;
    Ok(())
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let text: Option<String> = conn
        .query_row("SELECT json FROM settings WHERE key = ?", [key], |r| r.get(0))
        .optional()?;
    match text {
        Some(t) => Ok(Some(serde_json::from_str(&t)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    let text = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO settings(key, json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET json = excluded.json",
        (key, text),
    )?;
    Ok(())
}

fn ensure_snapshots_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "snapshots", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE snapshots ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch(
            "CREATE TABLE snapshots(key TEXT PRIMARY KEY, json TEXT NOT NULL);
             CREATE TABLE settings(key TEXT PRIMARY KEY, json TEXT NOT NULL);",
        )
        .expect("schema");
        ensure_snapshots_updated_at(&conn).expect("migrate");
        conn
    }

    #[test]
    fn snapshot_upsert_and_delete() {
        let conn = memory();
        assert_eq!(snapshot_get(&conn, "edutrack-majors").expect("get"), None);
        snapshot_put(&conn, "edutrack-majors", "[]").expect("put");
        snapshot_put(&conn, "edutrack-majors", "[1]").expect("put again");
        assert_eq!(
            snapshot_get(&conn, "edutrack-majors").expect("get").as_deref(),
            Some("[1]")
        );
        snapshot_delete(&conn, "edutrack-majors").expect("delete");
        snapshot_delete(&conn, "edutrack-majors").expect("delete absent");
        assert_eq!(snapshot_get(&conn, "edutrack-majors").expect("get"), None);
    }

    #[test]
    fn settings_roundtrip() {
        let conn = memory();
        assert!(settings_get_json(&conn, "setup.qr").expect("get").is_none());
        settings_set_json(&conn, "setup.qr", &json!({ "size": 300 })).expect("set");
        let v = settings_get_json(&conn, "setup.qr").expect("get").expect("saved");
        assert_eq!(v["size"], 300);
    }
}
