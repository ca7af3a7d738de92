//! Ghostfest Core - Headless library for festival registration.
//!
//! This crate holds the registration rules, the SQLite store and the admin
//! operations. It can be used programmatically without any HTTP/RPC layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use ghostfest_core::{GhostfestApi, RegistrationForm};
//!
//! fn main() -> ghostfest_core::Result<()> {
//!     let api = GhostfestApi::builder("/var/lib/ghostfest")
//!         .auto_create_dirs(true)
//!         .owner_phone("60123456789")
//!         .build()?;
//!
//!     let outcome = api.register(form)?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod entries;
pub mod error;
pub mod export;
pub mod models;
pub mod phone;
pub mod pricing;
pub mod store;
pub mod undo;
pub mod whatsapp;

mod api;

// Re-export commonly used types
pub use api::{
    EditForm, EditView, GhostfestApiBuilder, MarkPaidResult, OrderCheck, OrderChoice,
    OrderRef, RegistrationForm, RegistrationOutcome, ReviewView, WhatsAppLink,
};
pub use dashboard::{DashboardQuery, DashboardView, OrderView, Pagination};
pub use error::{GhostfestError, Result};
pub use models::{
    AdminLogEntry, AdminSession, ApiResponse, BoatChoice, PaymentMethod, Role, SeedAccount,
    SpiritEntry, Submission,
};
pub use store::Database;
pub use undo::UndoCache;

use std::path::{Path, PathBuf};

/// Main API struct for Ghostfest operations.
///
/// Public intake, order lookup and every admin action go through this
/// facade. It owns the database handle and the in-memory undo slots.
pub struct GhostfestApi {
    /// Directory holding the database file
    data_dir: PathBuf,
    db: Database,
    undo: UndoCache,
    /// Owner's WhatsApp number for approval requests
    owner_phone: String,
    /// Base URL used in links sent to registrants
    public_url: String,
}

impl GhostfestApi {
    /// Create a builder for GhostfestApi.
    ///
    /// ```rust,ignore
    /// let api = GhostfestApi::builder("./data")
    ///     .auto_create_dirs(true)
    ///     .build()?;
    /// ```
    pub fn builder(data_dir: impl Into<PathBuf>) -> GhostfestApiBuilder {
        GhostfestApiBuilder::new(data_dir)
    }

    /// Open the API over an existing data directory with default settings.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(data_dir).build()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    /// Whether public registration is currently closed.
    pub fn intake_paused(&self) -> Result<bool> {
        self.db.is_paused()
    }
}
