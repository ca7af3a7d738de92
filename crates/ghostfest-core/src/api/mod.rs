//! API implementation submodules.
//!
//! Each submodule contains `impl GhostfestApi` blocks that extend the public
//! API with domain-specific methods. The struct definition remains in `lib.rs`.

mod admin;
mod builder;
mod lookup;
mod registration;

pub use admin::{EditForm, EditView, MarkPaidResult, WhatsAppLink};
pub use builder::GhostfestApiBuilder;
pub use lookup::{OrderCheck, OrderChoice, ReviewView};
pub use registration::{OrderRef, RegistrationForm, RegistrationOutcome};
