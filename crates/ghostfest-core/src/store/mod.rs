//! SQLite persistence for submissions, staff accounts, the audit log and the
//! intake switch.
//!
//! One connection is shared behind `Arc<Mutex<_>>`; the database runs in WAL
//! mode so a backup snapshot can be taken while the service keeps writing.

mod admin;
mod submissions;

use crate::config::DatabaseConfig;
use crate::error::{GhostfestError, Result};
use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Handle to the service database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database at `db_path` and ensure the schema.
    pub fn open_at(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| GhostfestError::Io {
                    message: format!("Failed to create database directory: {}", parent.display()),
                    path: Some(parent.to_path_buf()),
                    source: Some(e),
                })?;
            }
        }

        let conn = Connection::open(db_path).map_err(|e| GhostfestError::Database {
            message: format!("Failed to open database {}: {}", db_path.display(), e),
            source: Some(e),
        })?;
        Self::configure_connection(&conn)?;
        Self::ensure_schema(&conn)?;

        info!("Opened database at {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: db_path.to_path_buf(),
        })
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA busy_timeout={};\n\
             PRAGMA synchronous=NORMAL;\n\
             PRAGMA foreign_keys=ON;",
            DatabaseConfig::BUSY_TIMEOUT_MS,
        ))?;
        Ok(())
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id TEXT NOT NULL,
                date TEXT NOT NULL,
                boat TEXT NOT NULL,
                gender TEXT NOT NULL DEFAULT '',
                name_cn TEXT NOT NULL,
                name_en TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                count INTEGER NOT NULL,
                total INTEGER NOT NULL,
                paid INTEGER NOT NULL DEFAULT 0,
                entries TEXT NOT NULL DEFAULT '[]',
                payment_amount INTEGER NOT NULL DEFAULT 0,
                remarks TEXT NOT NULL DEFAULT ''
            );

            -- Public lookup by 4-digit code
            CREATE INDEX IF NOT EXISTS idx_submissions_order
                ON submissions(order_id);

            -- Duplicate detection by Chinese name
            CREATE INDEX IF NOT EXISTS idx_submissions_name
                ON submissions(name_cn);

            CREATE TABLE IF NOT EXISTS admin_accounts (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS admin_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                action TEXT NOT NULL,
                username TEXT NOT NULL,
                detail TEXT NOT NULL DEFAULT '',
                ts TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_admin_log_action
                ON admin_log(action, username);

            CREATE TABLE IF NOT EXISTS sys_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                paused INTEGER NOT NULL DEFAULT 0
            );

            INSERT OR IGNORE INTO sys_state (id, paused) VALUES (1, 0);
            "#,
        )
        .map_err(|e| GhostfestError::Database {
            message: format!("Failed to initialize schema: {}", e),
            source: Some(e),
        })?;
        debug!("Database schema ready");
        Ok(())
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| GhostfestError::Database {
            message: "Failed to acquire database connection lock".to_string(),
            source: None,
        })
    }

    /// Write a consistent copy of the database to `dest`.
    fn snapshot_to(&self, dest: &Path) -> Result<()> {
        if dest.exists() {
            std::fs::remove_file(dest).map_err(|e| GhostfestError::io_with_path(e, dest))?;
        }
        let dest_str = dest.to_string_lossy().into_owned();
        let conn = self.lock_conn()?;
        conn.execute("VACUUM INTO ?1", params![dest_str])?;
        Ok(())
    }

    /// Read a consistent copy of the database into memory.
    pub fn snapshot_bytes(&self) -> Result<Vec<u8>> {
        let dir = tempfile::tempdir()?;
        let dest = dir.path().join(DatabaseConfig::BACKUP_DOWNLOAD_NAME);
        self.snapshot_to(&dest)?;
        std::fs::read(&dest).map_err(|e| GhostfestError::io_with_path(e, &dest))
    }
}

fn format_ts(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339()
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).map_err(|e| conversion_error(idx, e))
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}
