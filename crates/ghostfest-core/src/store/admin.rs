//! Staff accounts, the audit log and the intake switch.

use super::{conversion_error, format_ts, parse_ts, Database};
use crate::config::local_now;
use crate::error::{GhostfestError, Result};
use crate::models::{AdminAccount, AdminLogEntry, Role};
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeMap;

#[derive(Debug)]
struct UnknownRole(String);

impl std::fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl Database {
    /// Create the account unless the username is already taken.
    ///
    /// Returns true when a row was inserted.
    pub fn insert_account_if_missing(&self, account: &AdminAccount) -> Result<bool> {
        let conn = self.lock_conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO admin_accounts (username, password_hash, role) VALUES (?1, ?2, ?3)",
            params![account.username, account.password_hash, account.role.as_str()],
        )?;
        Ok(inserted > 0)
    }

    pub fn get_account(&self, username: &str) -> Result<Option<AdminAccount>> {
        let conn = self.lock_conn()?;
        let account = conn
            .query_row(
                "SELECT username, password_hash, role FROM admin_accounts WHERE username = ?1",
                params![username],
                |row| {
                    let role: String = row.get(2)?;
                    let role = Role::parse(&role)
                        .ok_or_else(|| conversion_error(2, UnknownRole(role.clone())))?;
                    Ok(AdminAccount {
                        username: row.get(0)?,
                        password_hash: row.get(1)?,
                        role,
                    })
                },
            )
            .optional()?;
        Ok(account)
    }

    /// Append an audit row stamped with the local time.
    pub fn append_log(&self, action: &str, user: &str, detail: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO admin_log (action, username, detail, ts) VALUES (?1, ?2, ?3, ?4)",
            params![action, user, detail, format_ts(&local_now())],
        )?;
        Ok(())
    }

    /// The most recent audit rows, newest first.
    pub fn recent_logs(&self, limit: usize) -> Result<Vec<AdminLogEntry>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, action, username, detail, ts FROM admin_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let ts: String = row.get(4)?;
                Ok(AdminLogEntry {
                    id: row.get(0)?,
                    action: row.get(1)?,
                    user: row.get(2)?,
                    detail: row.get(3)?,
                    ts: parse_ts(4, &ts)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Latest timestamp of `action` per user.
    pub fn latest_by_user(&self, action: &str) -> Result<BTreeMap<String, String>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT username, ts FROM admin_log WHERE action = ?1 ORDER BY id",
        )?;
        let mut latest = BTreeMap::new();
        let rows = stmt.query_map(params![action], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        // Rows arrive in insertion order, so the last write per user wins.
        for row in rows {
            let (user, ts) = row?;
            latest.insert(user, ts);
        }
        Ok(latest)
    }

    pub fn is_paused(&self) -> Result<bool> {
        let conn = self.lock_conn()?;
        let paused = conn
            .query_row("SELECT paused FROM sys_state WHERE id = 1", [], |row| {
                row.get::<_, bool>(0)
            })
            .optional()?;
        Ok(paused.unwrap_or(false))
    }

    pub fn set_paused(&self, paused: bool) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO sys_state (id, paused) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET paused = excluded.paused",
            params![paused],
        )?;
        Ok(())
    }

    /// Flip the intake switch and return the new state.
    pub fn toggle_paused(&self) -> Result<bool> {
        let conn = self.lock_conn()?;
        let paused: bool = conn
            .query_row(
                "UPDATE sys_state SET paused = 1 - paused WHERE id = 1 RETURNING paused",
                [],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| GhostfestError::Database {
                message: "System state row is missing".to_string(),
                source: None,
            })?;
        Ok(paused)
    }
}
