//! Data models for the registration service.
//!
//! These are the shapes stored in SQLite and returned over JSON-RPC.

mod admin;
mod api_response;
mod submission;

pub use admin::*;
pub use api_response::*;
pub use submission::*;
