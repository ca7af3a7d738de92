//! Public registration with duplicate detection.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::local_now;
use crate::error::{GhostfestError, Result};
use crate::models::{BoatChoice, NewSubmission, PaymentMethod, SpiritEntry, Submission};
use crate::phone::{full_phone, local_phone, order_code};
use crate::pricing::compute_total;
use crate::GhostfestApi;

/// The registration form as submitted by an attendee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub boat: BoatChoice,
    /// Registrant's own gender.
    #[serde(default)]
    pub gender: String,
    pub name_cn: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub country_code: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub entries: Vec<SpiritEntry>,
    /// Set on resubmission after the attendee confirms overwriting a
    /// previous registration.
    #[serde(default)]
    pub confirm: bool,
}

impl RegistrationForm {
    fn validate(&self) -> Result<()> {
        if self.name_cn.trim().is_empty() {
            return Err(GhostfestError::validation("name_cn", "Chinese name is required"));
        }
        // Fails when the number is too short to yield an order code.
        order_code(&self.phone)?;
        if self.entries.is_empty() {
            return Err(GhostfestError::validation(
                "entries",
                "At least one entry is required",
            ));
        }
        Ok(())
    }

    fn stored_phone(&self) -> String {
        full_phone(&self.country_code, &self.phone)
    }
}

/// Key used to find a submission's review page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRef {
    pub order_id: String,
    pub phone: String,
}

impl From<&Submission> for OrderRef {
    fn from(s: &Submission) -> Self {
        Self {
            order_id: s.order_id.clone(),
            phone: s.phone.clone(),
        }
    }
}

/// What `register` did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    Created(OrderRef),
    /// An earlier registration was overwritten in place.
    Updated(OrderRef),
    /// A registration with the same name and phone exists; resubmit with
    /// `confirm` to overwrite it.
    NeedsConfirmation {
        existing: Submission,
        dup_key: String,
    },
}

impl GhostfestApi {
    /// Register an attendee, or update their earlier registration.
    pub fn register(&self, form: RegistrationForm) -> Result<RegistrationOutcome> {
        if self.db.is_paused()? {
            return Err(GhostfestError::IntakePaused);
        }
        form.validate()?;

        let local = local_phone(&form.phone);
        let duplicate = self
            .db
            .find_by_name_cn(&form.name_cn)?
            .into_iter()
            .find(|s| local_phone(&s.phone) == local);

        let entry_count = form.entries.len();
        let total = compute_total(form.boat, entry_count);

        match duplicate {
            Some(mut existing) if form.confirm => {
                existing.boat = form.boat;
                existing.gender = form.gender.clone();
                existing.name_en = form.name_en.clone();
                existing.phone = form.stored_phone();
                existing.payment_method = form.payment_method;
                existing.count = entry_count as u32;
                existing.total = total;
                existing.entries = form.entries;
                existing.date = local_now();
                self.db.update_submission(&existing)?;
                info!(
                    "Registration {} overwritten for order {}",
                    existing.id, existing.order_id
                );
                Ok(RegistrationOutcome::Updated(OrderRef::from(&existing)))
            }
            Some(existing) => {
                let dup_key = format!("{}_{}", form.name_cn, local);
                info!("Registration for order {} needs confirmation", existing.order_id);
                Ok(RegistrationOutcome::NeedsConfirmation { existing, dup_key })
            }
            None => {
                let phone = form.stored_phone();
                let created = self.db.insert_submission(NewSubmission {
                    order_id: order_code(&phone)?,
                    date: local_now(),
                    boat: form.boat,
                    gender: form.gender,
                    name_cn: form.name_cn,
                    name_en: form.name_en,
                    phone,
                    payment_method: form.payment_method,
                    total,
                    entries: form.entries,
                })?;
                info!(
                    "Registration {} created with order {} ({} entries, total {})",
                    created.id, created.order_id, created.count, created.total
                );
                Ok(RegistrationOutcome::Created(OrderRef::from(&created)))
            }
        }
    }
}
