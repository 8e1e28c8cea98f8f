//! SQLite persistence for snapshots
//!
//! The snapshot file holds one table per category (`Target`, `Pass`, `Fail`,
//! `Unresolved`) with a fixed column set, plus a `snapshot_meta` table.
//! Readers select columns by name, so extra columns added later are ignored,
//! and a missing category table reads as an empty sheet.
//!
//! Writes never touch the live file: the new snapshot is written to a sibling
//! temporary file and renamed over the old one.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OpenFlags};
use tracing::debug;

use super::{Category, Snapshot, SnapshotRow};
use crate::core::error::{SyncError, SyncResult};

/// Bumped when the column layout changes incompatibly
pub const SNAPSHOT_SCHEMA_VERSION: i32 = 1;

/// Column names, paired with the header shown in exports
pub const COLUMNS: [(&str, &str); 8] = [
    ("issue_key", "Issue Key"),
    ("filter", "Filter"),
    ("summary", "Summary"),
    ("platform", "Platform"),
    ("ip", "IP"),
    ("status", "Status"),
    ("due_date", "Due Date"),
    ("resolution", "Resolution"),
];

/// A snapshot file on disk
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every sheet to a temporary file, then atomically replace the snapshot
    pub fn write(&self, snapshot: &Snapshot) -> SyncResult<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot.db".to_string());
        // Unique per writer; dropped (and removed) on any failure below
        let temp = tempfile::Builder::new()
            .prefix(&format!(".{}.tmp-", name))
            .tempfile_in(&parent)?;

        write_database(temp.path(), snapshot)?;
        temp.persist(&self.path).map_err(|e| SyncError::Io(e.error))?;

        debug!(path = %self.path.display(), rows = snapshot.row_count(), "snapshot written");
        Ok(())
    }

    /// Read the snapshot.
    ///
    /// Missing, permission-denied, or locked files are reported as
    /// [`SyncError::SourceUnavailable`]; anything that reads but does not parse
    /// is [`SyncError::DataCorrupt`].
    pub fn read(&self) -> SyncResult<Snapshot> {
        // Probe with a plain open so missing/permission errors keep their io kind
        File::open(&self.path).map_err(|e| classify_io(&self.path, e))?;

        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(classify_sqlite)?;

        let tables = existing_tables(&conn).map_err(classify_sqlite)?;
        if !tables.contains("snapshot_meta") {
            return Err(SyncError::DataCorrupt {
                message: format!("{}: no snapshot_meta table", self.path.display()),
            });
        }
        let meta = read_meta(&conn).map_err(classify_sqlite)?;
        if meta.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(SyncError::DataCorrupt {
                message: format!(
                    "{}: unsupported schema version {}",
                    self.path.display(),
                    meta.schema_version
                ),
            });
        }

        let mut rows = Vec::new();
        for category in Category::ALL {
            if tables.contains(category.as_str()) {
                rows.extend(read_sheet(&conn, category).map_err(classify_sqlite)?);
            }
        }

        Ok(Snapshot::from_rows(rows, meta.built_at))
    }
}

fn write_database(path: &Path, snapshot: &Snapshot) -> SyncResult<()> {
    let mut conn = Connection::open(path).map_err(write_failed)?;
    let tx = conn.transaction().map_err(write_failed)?;

    tx.execute_batch(
        r#"
        CREATE TABLE snapshot_meta (
            schema_version INTEGER NOT NULL,
            built_at TEXT
        );
        "#,
    )
    .map_err(write_failed)?;
    tx.execute(
        "INSERT INTO snapshot_meta (schema_version, built_at) VALUES (?1, ?2)",
        params![
            SNAPSHOT_SCHEMA_VERSION,
            snapshot.built_at.map(|t| t.to_rfc3339())
        ],
    )
    .map_err(write_failed)?;

    for category in Category::ALL {
        let columns: Vec<String> = COLUMNS
            .iter()
            .map(|(name, _)| format!("{} TEXT", name))
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE \"{}\" ({});",
            category.as_str(),
            columns.join(", ")
        ))
        .map_err(write_failed)?;

        let mut insert = tx
            .prepare(&format!(
                "INSERT INTO \"{}\" (issue_key, filter, summary, platform, ip, status, due_date, resolution)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                category.as_str()
            ))
            .map_err(write_failed)?;
        for row in snapshot.sheet(category) {
            insert
                .execute(params![
                    row.issue_key,
                    row.filter,
                    row.summary,
                    row.platform,
                    row.interface_id,
                    row.status,
                    row.due_date,
                    row.resolution,
                ])
                .map_err(write_failed)?;
        }
    }

    tx.commit().map_err(write_failed)?;
    conn.close().map_err(|(_, e)| write_failed(e))?;
    Ok(())
}

fn existing_tables(conn: &Connection) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(names)
}

fn read_sheet(conn: &Connection, category: Category) -> rusqlite::Result<Vec<SnapshotRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT issue_key, filter, summary, platform, ip, status, due_date, resolution
         FROM \"{}\" ORDER BY rowid",
        category.as_str()
    ))?;
    let rows = stmt
        .query_map([], |row| {
            let text = |i: usize| -> rusqlite::Result<String> {
                Ok(row.get::<_, Option<String>>(i)?.unwrap_or_default())
            };
            Ok(SnapshotRow {
                issue_key: text(0)?,
                filter: text(1)?,
                summary: text(2)?,
                platform: text(3)?,
                interface_id: text(4)?,
                status: text(5)?,
                due_date: text(6)?,
                resolution: text(7)?,
                category,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

struct Meta {
    schema_version: i32,
    built_at: Option<DateTime<Utc>>,
}

fn read_meta(conn: &Connection) -> rusqlite::Result<Meta> {
    let (schema_version, raw): (i32, Option<String>) = conn.query_row(
        "SELECT schema_version, built_at FROM snapshot_meta LIMIT 1",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let built_at = raw
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc));
    Ok(Meta {
        schema_version,
        built_at,
    })
}

fn classify_io(path: &Path, err: std::io::Error) -> SyncError {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => SyncError::SourceUnavailable {
            message: format!("{}: {}", path.display(), err),
        },
        _ => SyncError::Io(err),
    }
}

/// Failures while producing a new snapshot say nothing about the live one
fn write_failed(err: rusqlite::Error) -> SyncError {
    SyncError::Io(std::io::Error::other(err))
}

fn classify_sqlite(err: rusqlite::Error) -> SyncError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(
                e.code,
                ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::CannotOpen
                    | ErrorCode::PermissionDenied
            ) =>
        {
            SyncError::SourceUnavailable {
                message: err.to_string(),
            }
        }
        _ => SyncError::DataCorrupt {
            message: err.to_string(),
        },
    }
}
