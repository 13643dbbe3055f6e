//! Workspace backups. A bundle is a zip holding `manifest.json`, the
//! workspace database and a small metadata entry. Imports are read and
//! checked completely before anything in the workspace is touched.

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DB_FILE: &str = "edutrack.sqlite3";
const DB_ENTRY: &str = "db/edutrack.sqlite3";
const META_WORKSPACE_ENTRY: &str = "meta/workspace.json";
const IMPORTING_SUFFIX: &str = "importing";
const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
pub const BUNDLE_FORMAT_V1: &str = "edutrack-workspace-v1";
pub const PLAIN_SQLITE_FORMAT: &str = "sqlite3";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    format: String,
    #[serde(default)]
    version: u32,
    #[serde(default)]
    app_version: Option<String>,
    #[serde(default)]
    exported_at: Option<String>,
    #[serde(default)]
    db_sha256: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub db_sha256: String,
}

/// A backup that has been read into memory and verified.
#[derive(Debug)]
pub struct BackupSource {
    pub format: &'static str,
    db_bytes: Vec<u8>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn ensure_sqlite(bytes: &[u8], origin: &str) -> anyhow::Result<()> {
    if !bytes.starts_with(SQLITE_HEADER) {
        bail!("{} is not a SQLite database", origin);
    }
    Ok(())
}

fn write_entry(
    zip: &mut ZipWriter<File>,
    name: &str,
    bytes: &[u8],
    opts: FileOptions,
) -> anyhow::Result<()> {
    zip.start_file(name, opts)
        .with_context(|| format!("failed to start entry {}", name))?;
    zip.write_all(bytes)
        .with_context(|| format!("failed to write entry {}", name))
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let db_path = workspace_path.join(DB_FILE);
    let db_bytes = std::fs::read(&db_path)
        .with_context(|| format!("workspace database not readable: {}", db_path.display()))?;
    let db_sha256 = sha256_hex(&db_bytes);

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let out_file = File::create(out_path)
        .with_context(|| format!("failed to create output file {}", out_path.display()))?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = Manifest {
        format: BUNDLE_FORMAT_V1.to_string(),
        version: 1,
        app_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        exported_at: Some(chrono::Utc::now().to_rfc3339()),
        db_sha256: Some(db_sha256.clone()),
    };
    let manifest_json =
        serde_json::to_vec_pretty(&manifest).context("failed to serialize manifest")?;
    let meta_json = serde_json::to_vec_pretty(&serde_json::json!({
        "sourceWorkspace": workspace_path.to_string_lossy(),
    }))
    .context("failed to serialize workspace metadata")?;

    let entries: [(&str, &[u8]); 3] = [
        (MANIFEST_ENTRY, &manifest_json),
        (DB_ENTRY, &db_bytes),
        (META_WORKSPACE_ENTRY, &meta_json),
    ];
    for (name, bytes) in entries {
        write_entry(&mut zip, name, bytes, opts)?;
    }
    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: entries.len(),
        db_sha256,
    })
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.display()))?;
    let mut sig = [0u8; 4];
    match f.read_exact(&mut sig) {
        Ok(()) => Ok(sig == ZIP_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e).context("failed to read file signature"),
    }
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    archive
        .by_name(name)
        .with_context(|| format!("bundle missing {}", name))?
        .read_to_end(&mut bytes)
        .with_context(|| format!("failed to extract {}", name))?;
    Ok(bytes)
}

fn read_bundle(in_path: &Path) -> anyhow::Result<BackupSource> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.display()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let manifest: Manifest = serde_json::from_slice(&read_entry(&mut archive, MANIFEST_ENTRY)?)
        .context("manifest.json is invalid")?;
    if manifest.format != BUNDLE_FORMAT_V1 {
        bail!("unsupported bundle format: {}", manifest.format);
    }

    let db_bytes = read_entry(&mut archive, DB_ENTRY)?;
    if let Some(expected) = manifest.db_sha256.as_deref() {
        let actual = sha256_hex(&db_bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(anyhow!(
                "database checksum mismatch: manifest {}, bundle {}",
                expected,
                actual
            ));
        }
    }
    ensure_sqlite(&db_bytes, DB_ENTRY)?;
    Ok(BackupSource {
        format: BUNDLE_FORMAT_V1,
        db_bytes,
    })
}

/// Reads and verifies a bundle or a plain SQLite copy. Nothing is written.
pub fn read_backup(in_path: &Path) -> anyhow::Result<BackupSource> {
    if is_zip_file(in_path)? {
        return read_bundle(in_path);
    }
    let db_bytes = std::fs::read(in_path)
        .with_context(|| format!("failed to read {}", in_path.display()))?;
    ensure_sqlite(&db_bytes, &in_path.display().to_string())?;
    Ok(BackupSource {
        format: PLAIN_SQLITE_FORMAT,
        db_bytes,
    })
}

/// Replaces the workspace database through a temp file and a rename, so a
/// failed write leaves the current database in place.
pub fn install_database(workspace_path: &Path, source: &BackupSource) -> anyhow::Result<()> {
    std::fs::create_dir_all(workspace_path)
        .with_context(|| format!("failed to create workspace {}", workspace_path.display()))?;
    let dst = workspace_path.join(DB_FILE);
    let tmp = workspace_path.join(format!("{}.{}", DB_FILE, IMPORTING_SUFFIX));

    let written = std::fs::write(&tmp, &source.db_bytes)
        .with_context(|| format!("failed to write temp database {}", tmp.display()))
        .and_then(|()| {
            std::fs::rename(&tmp, &dst)
                .with_context(|| format!("failed to move database into {}", dst.display()))
        });
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written
}
