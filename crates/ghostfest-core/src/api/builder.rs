//! Builder for configuring GhostfestApi initialization.

use std::path::PathBuf;

use crate::auth::hash_password;
use crate::config::{AppConfig, DatabaseConfig};
use crate::error::{GhostfestError, Result};
use crate::models::{AdminAccount, SeedAccount};
use crate::store::Database;
use crate::undo::UndoCache;
use crate::GhostfestApi;

/// Builder for configuring GhostfestApi initialization.
///
/// # Example
///
/// ```rust,ignore
/// use ghostfest_core::{GhostfestApi, SeedAccount};
///
/// let api = GhostfestApi::builder("./data")
///     .auto_create_dirs(true)
///     .owner_phone("60123456789")
///     .public_url("https://ghostfest.example")
///     .seed_account(SeedAccount::parse("Wilson:owner:secret").unwrap())
///     .build()?;
/// ```
pub struct GhostfestApiBuilder {
    data_dir: PathBuf,
    auto_create_dirs: bool,
    owner_phone: String,
    public_url: String,
    seed_accounts: Vec<SeedAccount>,
}

impl GhostfestApiBuilder {
    /// Create a new builder with the data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            auto_create_dirs: false,
            owner_phone: String::new(),
            public_url: AppConfig::DEFAULT_PUBLIC_URL.to_string(),
            seed_accounts: Vec::new(),
        }
    }

    /// Create the data directory if it doesn't exist.
    ///
    /// Default: `false` (the directory must exist)
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// WhatsApp number that receives approval requests.
    pub fn owner_phone(mut self, phone: impl Into<String>) -> Self {
        self.owner_phone = phone.into();
        self
    }

    /// Base URL placed in reminder messages, e.g. `https://ghostfest.example`.
    ///
    /// Default: [`AppConfig::DEFAULT_PUBLIC_URL`]
    pub fn public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Account to create on startup when the username is free.
    pub fn seed_account(mut self, account: SeedAccount) -> Self {
        self.seed_accounts.push(account);
        self
    }

    /// Build the GhostfestApi instance.
    pub fn build(self) -> Result<GhostfestApi> {
        if !self.data_dir.exists() {
            if self.auto_create_dirs {
                std::fs::create_dir_all(&self.data_dir).map_err(|e| GhostfestError::Io {
                    message: format!("Failed to create data directory: {}", self.data_dir.display()),
                    path: Some(self.data_dir.clone()),
                    source: Some(e),
                })?;
            } else {
                return Err(GhostfestError::Config {
                    message: format!("Data directory does not exist: {}", self.data_dir.display()),
                });
            }
        }

        let db = Database::open_at(&self.data_dir.join(DatabaseConfig::DB_FILE_NAME))?;

        for seed in &self.seed_accounts {
            let account = AdminAccount {
                username: seed.username.clone(),
                password_hash: hash_password(&seed.password),
                role: seed.role,
            };
            if db.insert_account_if_missing(&account)? {
                tracing::info!("Created {} account '{}'", seed.role.as_str(), seed.username);
            } else {
                tracing::debug!("Account '{}' already exists, not reseeding", seed.username);
            }
        }

        if self.owner_phone.trim().is_empty() {
            tracing::warn!("No owner WhatsApp number configured; approval requests are disabled");
        }

        Ok(GhostfestApi {
            data_dir: self.data_dir,
            db,
            undo: UndoCache::new(),
            owner_phone: self.owner_phone.trim().to_string(),
            public_url: self.public_url,
        })
    }
}
