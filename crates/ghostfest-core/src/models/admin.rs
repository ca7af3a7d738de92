//! Staff accounts, roles and the audit log.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Permission tier of a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May pause intake, delete directly and approve admin requests.
    Owner,
    /// May edit and mark paid; deletes and pauses need owner approval.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }
}

/// A stored login.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// The identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub username: String,
    pub role: Role,
}

impl AdminSession {
    pub fn is_owner(&self) -> bool {
        self.role.is_owner()
    }
}

/// One row of the admin audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLogEntry {
    pub id: i64,
    pub action: String,
    pub user: String,
    pub detail: String,
    pub ts: DateTime<FixedOffset>,
}

/// Account to create at startup when missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAccount {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl SeedAccount {
    /// Parse `name:role:password`. The password may itself contain colons.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, ':');
        let username = parts.next()?.trim();
        let role = Role::parse(parts.next()?)?;
        let password = parts.next()?;
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
            role,
        })
    }
}
