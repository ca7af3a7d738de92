//! Public order lookup by 4-digit code.

use serde::{Deserialize, Serialize};

use super::registration::OrderRef;
use crate::error::{GhostfestError, Result};
use crate::models::{EnrichedEntry, Submission};
use crate::phone::is_valid_order_code;
use crate::GhostfestApi;

/// Review page payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewView {
    pub order: Submission,
    pub entries: Vec<EnrichedEntry>,
    pub qr_url: String,
}

/// One row of the disambiguation list shown when a code is shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChoice {
    pub name_cn: String,
    pub phone: String,
}

/// Result of looking up an order code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderCheck {
    NotFound,
    Single(OrderRef),
    Multiple { choices: Vec<OrderChoice> },
}

impl GhostfestApi {
    /// The submission behind a review link.
    pub fn review(&self, order_id: &str, phone: &str) -> Result<ReviewView> {
        let order = self
            .db
            .find_by_order_and_phone(order_id.trim(), phone)?
            .ok_or_else(|| GhostfestError::SubmissionNotFound(format!("order {order_id}")))?;
        Ok(ReviewView {
            entries: order.enriched_entries(),
            qr_url: order.payment_method.qr_url().to_string(),
            order,
        })
    }

    /// Resolve a 4-digit code to one submission, or list the candidates.
    pub fn check_order(&self, code: &str) -> Result<OrderCheck> {
        let code = code.trim();
        if !is_valid_order_code(code) {
            return Err(GhostfestError::InvalidOrderCode(code.to_string()));
        }
        let mut matches = self.db.find_by_order_code(code)?;
        Ok(match matches.len() {
            0 => OrderCheck::NotFound,
            1 => OrderCheck::Single(OrderRef::from(&matches.remove(0))),
            _ => OrderCheck::Multiple {
                choices: matches
                    .into_iter()
                    .map(|s| OrderChoice {
                        name_cn: s.name_cn,
                        phone: s.phone,
                    })
                    .collect(),
            },
        })
    }

    /// Pick one candidate from the disambiguation list.
    ///
    /// `selection` is `"<name_cn>|<phone>"`; the name may not contain `|`.
    pub fn select_entry(&self, selection: &str) -> Result<OrderRef> {
        let (name_cn, phone) = selection
            .split_once('|')
            .ok_or_else(|| GhostfestError::InvalidParams {
                message: "Invalid selection.".to_string(),
            })?;
        let submission = self
            .db
            .find_by_name_and_phone(name_cn, phone)?
            .ok_or_else(|| GhostfestError::SubmissionNotFound("Record not found.".to_string()))?;
        Ok(OrderRef::from(&submission))
    }
}
