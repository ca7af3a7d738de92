//! Centralized configuration for the Ghostfest service.
//!
//! This module provides configuration constants for pricing, the admin
//! dashboard, the SQLite store and the payment channels, plus the local
//! clock used for every stored timestamp.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    /// Festival local time is UTC+8.
    pub const UTC_OFFSET_HOURS: i32 = 8;
    pub const DEFAULT_PUBLIC_URL: &'static str = "http://127.0.0.1:5000";
}

/// Entry pricing.
pub struct PricingConfig;

impl PricingConfig {
    /// Entries included with a boat seat.
    pub const FREE_ENTRIES_WITH_BOAT: u32 = 6;
    /// Price of each entry beyond the allowance.
    pub const UNIT_PRICE: i64 = 38;
}

/// Admin dashboard listing limits.
pub struct DashboardConfig;

impl DashboardConfig {
    pub const DEFAULT_PAGE: usize = 1;
    pub const DEFAULT_PER_PAGE: usize = 20;
    pub const MAX_PER_PAGE: usize = 200;
    pub const HISTORY_LIMIT: usize = 200;
    pub const LAST_UPDATED_FORMAT: &'static str = "%Y-%m-%d %I:%M %p";
    pub const ROW_DATE_FORMAT: &'static str = "%Y-%m-%d %H:%M";
    pub const UNKNOWN_DATE_LABEL: &'static str = "Notsure";
}

/// SQLite store configuration.
pub struct DatabaseConfig;

impl DatabaseConfig {
    pub const DB_FILE_NAME: &'static str = "ghostfest.db";
    pub const BUSY_TIMEOUT_MS: u64 = 5_000;
    pub const BACKUP_DOWNLOAD_NAME: &'static str = "ghostfest.db";
}

/// Payment channel assets.
pub struct PaymentConfig;

impl PaymentConfig {
    pub const TNG_QR_PATH: &'static str = "/static/tng_qr_code.jpeg";
    pub const BANK_TRANSFER_QR_PATH: &'static str = "/static/bank_transfer_qr_code.jpeg";
}

/// Password hashing parameters.
pub struct AuthConfig;

impl AuthConfig {
    pub const PBKDF2_ITERATIONS: u32 = 100_000;
    pub const SALT_LEN: usize = 16;
    pub const KEY_LEN: usize = 32;
    pub const HASH_SCHEME: &'static str = "pbkdf2_sha256";
    /// Idle lifetime of an admin session token.
    pub const SESSION_TTL: Duration = Duration::from_secs(12 * 3600);
}

/// The festival's fixed UTC+8 offset.
pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(AppConfig::UTC_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix())
}

/// Current time in festival local time.
pub fn local_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&local_offset())
}
