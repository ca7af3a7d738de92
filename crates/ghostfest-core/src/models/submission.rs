//! Registration records and their spirit entries.

use crate::config::PaymentConfig;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Whether the registrant takes a boat seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum BoatChoice {
    Yes,
    #[default]
    No,
}

impl BoatChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoatChoice::Yes => "yes",
            BoatChoice::No => "no",
        }
    }

    /// Lenient parse; anything that is not "yes" counts as no boat.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("yes") {
            BoatChoice::Yes
        } else {
            BoatChoice::No
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, BoatChoice::Yes)
    }
}

impl From<String> for BoatChoice {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

/// The two manual payment channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum PaymentMethod {
    Tng,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Tng => "tng",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tng" => Some(PaymentMethod::Tng),
            "bank_transfer" | "bank" => Some(PaymentMethod::BankTransfer),
            _ => None,
        }
    }

    /// QR code image shown on the review page.
    pub fn qr_url(&self) -> &'static str {
        match self {
            PaymentMethod::Tng => PaymentConfig::TNG_QR_PATH,
            PaymentMethod::BankTransfer => PaymentConfig::BANK_TRANSFER_QR_PATH,
        }
    }

    /// Short label used in exports.
    pub fn export_label(&self) -> &'static str {
        match self {
            PaymentMethod::Tng => "TNG",
            PaymentMethod::BankTransfer => "BANK",
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("unknown payment method `{}`", s))
    }
}

/// One named memorial slot.
///
/// Every field is free text as typed on the form; empty strings mean "not
/// given". The date label is derived on read, see [`crate::entries::label_date`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiritEntry {
    pub option: String,
    pub name_cn: String,
    pub gender: String,
    pub calendar: String,
    pub year: String,
    pub month: String,
    pub day: String,
}

/// A spirit entry with its display date attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedEntry {
    #[serde(flatten)]
    pub entry: SpiritEntry,
    pub death_date_label: String,
}

/// A submission that has not been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub order_id: String,
    pub date: DateTime<FixedOffset>,
    pub boat: BoatChoice,
    pub gender: String,
    pub name_cn: String,
    pub name_en: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub total: i64,
    pub entries: Vec<SpiritEntry>,
}

/// A stored registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub order_id: String,
    pub date: DateTime<FixedOffset>,
    pub boat: BoatChoice,
    pub gender: String,
    pub name_cn: String,
    pub name_en: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub count: u32,
    pub total: i64,
    pub paid: bool,
    pub entries: Vec<SpiritEntry>,
    pub payment_amount: i64,
    pub remarks: String,
}

impl Submission {
    /// Materialize a freshly inserted row.
    pub fn from_new(id: i64, new: NewSubmission) -> Self {
        Self {
            id,
            order_id: new.order_id,
            date: new.date,
            boat: new.boat,
            gender: new.gender,
            name_cn: new.name_cn,
            name_en: new.name_en,
            phone: new.phone,
            payment_method: new.payment_method,
            count: new.entries.len() as u32,
            total: new.total,
            paid: false,
            entries: new.entries,
            payment_amount: 0,
            remarks: String::new(),
        }
    }

    pub fn enriched_entries(&self) -> Vec<EnrichedEntry> {
        self.entries.iter().map(crate::entries::enrich).collect()
    }
}
