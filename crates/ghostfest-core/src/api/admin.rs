//! Staff operations: login, dashboard, payments, edits, deletes and undo.
//!
//! Every mutating call takes the acting [`AdminSession`] and writes an
//! audit row under that username.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::verify_password;
use crate::config::DashboardConfig;
use crate::dashboard::{build_dashboard, DashboardQuery, DashboardView, OrderView};
use crate::entries::normalize_entry;
use crate::error::{GhostfestError, Result};
use crate::export::render_csv;
use crate::models::{
    AdminLogEntry, AdminSession, ApiResponse, BoatChoice, PaymentMethod, SpiritEntry, Submission,
};
use crate::pricing::compute_total;
use crate::whatsapp::{delete_approval_message, pause_approval_message, reminder_message, wa_link};
use crate::GhostfestApi;

const LOGIN_ACTION: &str = "Admin login";

/// Paid state after `mark_paid`, with the refreshed collected total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPaidResult {
    pub paid: bool,
    pub total_paid: i64,
}

/// Editable fields of a submission, as loaded into the edit dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditView {
    pub boat: BoatChoice,
    pub gender: String,
    pub name_cn: String,
    pub name_en: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub count: u32,
    pub total: i64,
    pub payment_amount: i64,
    pub remarks: String,
    pub entries: Vec<SpiritEntry>,
}

/// Changes from the edit dialog. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditForm {
    pub boat: Option<BoatChoice>,
    pub gender: Option<String>,
    pub name_cn: Option<String>,
    pub name_en: Option<String>,
    pub phone: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_amount: Option<i64>,
    pub remarks: Option<String>,
    pub entries: Option<Vec<SpiritEntry>>,
}

impl EditForm {
    fn validate(&self) -> Result<()> {
        if let Some(entries) = &self.entries {
            if let Some(i) = entries.iter().position(|e| e.option.trim().is_empty()) {
                return Err(GhostfestError::validation(
                    "entries",
                    format!("Entry {} option cannot be blank.", i + 1),
                ));
            }
        }
        Ok(())
    }

    fn apply(self, target: &mut Submission) {
        if let Some(boat) = self.boat {
            target.boat = boat;
        }
        if let Some(gender) = self.gender {
            target.gender = gender;
        }
        if let Some(name_cn) = self.name_cn {
            target.name_cn = name_cn;
        }
        if let Some(name_en) = self.name_en {
            target.name_en = name_en;
        }
        if let Some(phone) = self.phone {
            target.phone = phone;
        }
        if let Some(method) = self.payment_method {
            target.payment_method = method;
        }
        if let Some(amount) = self.payment_amount {
            target.payment_amount = amount;
        }
        if let Some(remarks) = self.remarks {
            target.remarks = remarks;
        }
        if let Some(entries) = self.entries {
            target.entries = entries;
        }
        target.count = target.entries.len() as u32;
        target.total = compute_total(target.boat, target.entries.len());
    }
}

/// A prepared `wa.me` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsAppLink {
    pub whatsapp_link: String,
}

impl GhostfestApi {
    /// Check credentials and record the login.
    pub fn login(&self, username: &str, password: &str) -> Result<AdminSession> {
        let account = self
            .db
            .get_account(username.trim())?
            .filter(|a| verify_password(password, &a.password_hash))
            .ok_or_else(|| {
                warn!("Failed login attempt for '{}'", username);
                GhostfestError::InvalidCredentials
            })?;

        self.db.append_log(
            LOGIN_ACTION,
            &account.username,
            &format!("User {} logged in.", account.username),
        )?;
        info!("{} '{}' logged in", account.role.as_str(), account.username);
        Ok(AdminSession {
            username: account.username,
            role: account.role,
        })
    }

    pub fn logout(&self, session: &AdminSession) -> Result<()> {
        self.db.append_log(
            "Admin logout",
            &session.username,
            &format!("User {} logged out.", session.username),
        )
    }

    /// Latest login time per user, as shown on the login page.
    pub fn last_logins(&self) -> Result<BTreeMap<String, String>> {
        self.db.latest_by_user(LOGIN_ACTION)
    }

    pub fn dashboard(&self, session: &AdminSession, query: &DashboardQuery) -> Result<DashboardView> {
        let all = self.db.list_submissions()?;
        Ok(build_dashboard(
            &all,
            query,
            self.db.is_paused()?,
            session.is_owner(),
        ))
    }

    /// Every submission for a full table reload, newest first.
    pub fn refresh(&self) -> Result<Vec<OrderView>> {
        Ok(self
            .db
            .list_submissions()?
            .iter()
            .map(OrderView::from)
            .collect())
    }

    /// Record a payment amount and flip the paid flag.
    ///
    /// Free-of-charge orders are always marked paid. Otherwise the flag
    /// toggles, and un-marking clears the amount.
    pub fn mark_paid(
        &self,
        session: &AdminSession,
        id: i64,
        payment_amount: Option<&str>,
    ) -> Result<MarkPaidResult> {
        let mut sub = self.db.require_submission(id)?;
        if let Some(raw) = payment_amount {
            sub.payment_amount = raw.trim().parse().unwrap_or(0);
        }
        if sub.total == 0 {
            sub.paid = true;
        } else {
            sub.paid = !sub.paid;
            if !sub.paid {
                sub.payment_amount = 0;
            }
        }
        self.db.update_submission(&sub)?;
        self.db.append_log(
            if sub.paid { "Mark paid" } else { "Mark unpaid" },
            &session.username,
            &format!(
                "Order ID {} marked {} with amount {}",
                sub.order_id,
                if sub.paid { "paid" } else { "unpaid" },
                sub.payment_amount
            ),
        )?;

        Ok(MarkPaidResult {
            paid: sub.paid,
            total_paid: self.db.total_paid()?,
        })
    }

    pub fn edit_view(&self, id: i64) -> Result<EditView> {
        let sub = self.db.require_submission(id)?;
        Ok(EditView {
            entries: sub.entries.iter().map(normalize_entry).collect(),
            boat: sub.boat,
            gender: sub.gender,
            name_cn: sub.name_cn,
            name_en: sub.name_en,
            phone: sub.phone,
            payment_method: sub.payment_method,
            count: sub.count,
            total: sub.total,
            payment_amount: sub.payment_amount,
            remarks: sub.remarks,
        })
    }

    /// Apply an edit, keeping the previous version for `undo_edit`.
    pub fn edit(&self, session: &AdminSession, id: i64, form: EditForm) -> Result<Submission> {
        form.validate()?;
        let before = self.db.require_submission(id)?;
        let mut after = before.clone();
        form.apply(&mut after);

        self.undo.remember_edit(before);
        self.db.update_submission(&after)?;
        self.db.append_log(
            "Edit submission",
            &session.username,
            &format!(
                "Edited submission ID {} with total {} and count {}",
                id, after.total, after.count
            ),
        )?;
        Ok(after)
    }

    /// WhatsApp payment reminder for an unpaid order.
    pub fn send_reminder(&self, session: &AdminSession, id: i64) -> Result<ApiResponse<WhatsAppLink>> {
        let sub = self.db.require_submission(id)?;
        if sub.paid {
            return Ok(ApiResponse::error("Already paid"));
        }
        let link = wa_link(&sub.phone, &reminder_message(&sub, &self.public_url));
        self.db.append_log(
            "Send WhatsApp reminder",
            &session.username,
            &format!("Sent reminder to {} for Order ID {}", sub.phone, sub.order_id),
        )?;
        Ok(ApiResponse::success(WhatsAppLink {
            whatsapp_link: link,
        }))
    }

    /// Open or close public registration. Owner only.
    pub fn toggle_pause(&self, session: &AdminSession) -> Result<bool> {
        if !session.is_owner() {
            return Err(GhostfestError::Forbidden(
                "Only the owner can pause or resume submissions.".to_string(),
            ));
        }
        let paused = self.db.toggle_paused()?;
        self.db.append_log(
            if paused { "Pause Submissions" } else { "Resume Submissions" },
            &session.username,
            &format!("Submissions {} by user.", if paused { "paused" } else { "resumed" }),
        )?;
        info!("Submissions {} by {}", if paused { "paused" } else { "resumed" }, session.username);
        Ok(paused)
    }

    /// Link asking the owner to pause or resume intake.
    pub fn request_pause_approval(&self, session: &AdminSession) -> Result<WhatsAppLink> {
        let owner = self.owner_phone()?;
        let link = wa_link(owner, &pause_approval_message(&session.username));
        self.db.append_log(
            "Request pause/resume approval",
            &session.username,
            "Requested owner approval to pause/resume submissions.",
        )?;
        Ok(WhatsAppLink {
            whatsapp_link: link,
        })
    }

    /// Delete a submission, keeping it for `undo_delete`. Owner only.
    pub fn delete(&self, session: &AdminSession, id: i64) -> Result<()> {
        if !session.is_owner() {
            return Err(GhostfestError::Forbidden(
                "Only the owner can delete. Ask owner for approval.".to_string(),
            ));
        }
        let sub = self.db.require_submission(id)?;
        self.undo.remember_delete(sub.clone());
        self.db.delete_submission(id)?;
        self.db.append_log(
            "Delete submission",
            &session.username,
            &format!(
                "Deleted submission ID {} (Order ID {}, Name {})",
                id, sub.order_id, sub.name_cn
            ),
        )
    }

    /// Link asking the owner to delete a submission.
    pub fn request_delete_approval(&self, session: &AdminSession, id: i64) -> Result<WhatsAppLink> {
        if session.is_owner() {
            return Err(GhostfestError::validation("id", "Owner can delete directly."));
        }
        let sub = self.db.require_submission(id)?;
        let owner = self.owner_phone()?;
        let link = wa_link(owner, &delete_approval_message(&session.username, &sub));
        self.db.append_log(
            "Request delete approval",
            &session.username,
            &format!(
                "Requested owner approval to delete submission ID {} (Order ID {})",
                id, sub.order_id
            ),
        )?;
        Ok(WhatsAppLink {
            whatsapp_link: link,
        })
    }

    /// Revert the most recent edit.
    pub fn undo_edit(&self, session: &AdminSession) -> Result<Submission> {
        let before = self
            .undo
            .peek_edit()
            .ok_or_else(|| GhostfestError::UndoUnavailable("No recent edit to undo.".to_string()))?;
        if self.db.get_submission(before.id)?.is_none() {
            return Err(GhostfestError::UndoUnavailable(
                "Record not found for undo.".to_string(),
            ));
        }
        self.db.update_submission(&before)?;
        self.undo.take_edit();
        self.db.append_log(
            "Undo Edit",
            &session.username,
            &format!(
                "Reverted edit for submission Order ID: {}, Name: {}",
                before.order_id, before.name_cn
            ),
        )?;
        Ok(before)
    }

    /// Restore the most recently deleted submission under its original id.
    pub fn undo_delete(&self, session: &AdminSession) -> Result<Submission> {
        let removed = self.undo.peek_delete().ok_or_else(|| {
            GhostfestError::UndoUnavailable("No recent deletion to undo.".to_string())
        })?;
        let id_taken = self.db.get_submission(removed.id)?.is_some();
        let order_taken = self
            .db
            .find_by_order_and_phone(&removed.order_id, &removed.phone)?
            .is_some();
        if id_taken || order_taken {
            return Err(GhostfestError::Conflict(
                "Order ID already exists, cannot undo.".to_string(),
            ));
        }
        self.db.restore_submission(&removed)?;
        self.undo.take_delete();
        self.db.append_log(
            "Undo Delete",
            &session.username,
            &format!(
                "Restored deleted submission Order ID: {}, Name: {}",
                removed.order_id, removed.name_cn
            ),
        )?;
        Ok(removed)
    }

    /// The owner's WhatsApp number.
    pub fn owner_phone(&self) -> Result<&str> {
        if self.owner_phone.is_empty() {
            return Err(GhostfestError::Config {
                message: "Owner WhatsApp number is not configured".to_string(),
            });
        }
        Ok(&self.owner_phone)
    }

    /// The latest audit entries, newest first.
    pub fn history(&self) -> Result<Vec<AdminLogEntry>> {
        self.db.recent_logs(DashboardConfig::HISTORY_LIMIT)
    }

    /// Every submission as CSV, oldest first.
    pub fn export_csv(&self, session: &AdminSession) -> Result<String> {
        let mut all = self.db.list_submissions()?;
        all.sort_by_key(|s| s.id);
        let csv = render_csv(&all);
        self.db.append_log(
            "Export CSV",
            &session.username,
            &format!("Exported CSV report with {} submissions", all.len()),
        )?;
        Ok(csv)
    }

    /// A consistent copy of the database file.
    pub fn backup(&self, session: &AdminSession) -> Result<Vec<u8>> {
        // Log first so the snapshot includes this download.
        self.db
            .append_log("Backup database", &session.username, "Downloaded database backup file")?;
        self.db.snapshot_bytes()
    }
}
