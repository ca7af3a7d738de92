//! Spirit entry labels and normalization.
//!
//! Entries are stored exactly as typed on the registration form. The helpers
//! here derive the display date, fold free-text genders for statistics, map
//! values to the canonical set used by the edit dialog, and produce the
//! bilingual labels used in exports.

use crate::models::{BoatChoice, EnrichedEntry, SpiritEntry};

/// Offering categories accepted by the edit dialog.
pub const VALID_OPTIONS: [&str; 5] = ["祖先", "冤亲债主", "无主孤魂", "婴灵", "狗狗"];

/// Gender bucket used by the dashboard statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderBucket {
    Male,
    Female,
    Unknown,
}

/// Human-readable date of passing, e.g. `1950年 3月 12日（农历）`.
pub fn label_date(entry: &SpiritEntry) -> String {
    let parts: Vec<String> = [
        (entry.year.trim(), "年"),
        (entry.month.trim(), "月"),
        (entry.day.trim(), "日"),
    ]
    .into_iter()
    .filter(|(value, _)| !value.is_empty())
    .map(|(value, unit)| format!("{value}{unit}"))
    .collect();

    let mut label = parts.join(" ");
    let calendar = entry.calendar.trim();
    if !calendar.is_empty() {
        match calendar.to_lowercase().as_str() {
            "lunar" => label.push_str("（农历）"),
            "english" => label.push_str("（阳历）"),
            _ => label.push_str(&format!("（{calendar}）")),
        }
    }
    label.trim().to_string()
}

/// Attach the derived date label to an entry.
pub fn enrich(entry: &SpiritEntry) -> EnrichedEntry {
    EnrichedEntry {
        death_date_label: label_date(entry),
        entry: entry.clone(),
    }
}

/// Fold a free-text gender into a statistics bucket.
pub fn normalize_gender(raw: &str) -> GenderBucket {
    let lowered = raw.trim().to_lowercase();
    if raw.contains('男') || lowered.starts_with('m') {
        GenderBucket::Male
    } else if raw.contains('女') || lowered.starts_with('f') {
        GenderBucket::Female
    } else {
        GenderBucket::Unknown
    }
}

/// Canonical form of an entry for the edit dialog's dropdowns.
pub fn normalize_entry(entry: &SpiritEntry) -> SpiritEntry {
    let option = if VALID_OPTIONS.contains(&entry.option.as_str()) {
        entry.option.clone()
    } else {
        String::new()
    };

    let gender = match entry.gender.trim().to_lowercase().as_str() {
        "男" | "m" | "male" => "male",
        "女" | "f" | "female" => "female",
        _ => "",
    };

    let calendar = entry.calendar.trim().to_lowercase();
    let calendar = if calendar.starts_with("eng") {
        "english"
    } else if calendar.starts_with("lun") {
        "lunar"
    } else {
        ""
    };

    SpiritEntry {
        option,
        name_cn: entry.name_cn.clone(),
        gender: gender.to_string(),
        calendar: calendar.to_string(),
        year: entry.year.clone(),
        month: entry.month.clone(),
        day: entry.day.clone(),
    }
}

/// Option with its English gloss, e.g. `祖先 (Ancestor)`.
pub fn option_label(option: &str) -> String {
    let gloss = match option {
        "祖先" => "Ancestor",
        "冤亲债主" => "Debtors",
        "无主孤魂" => "Spirits",
        "婴灵" => "Baby",
        "狗狗" => "Dogs",
        _ => return option.to_string(),
    };
    format!("{option} ({gloss})")
}

/// Gender as `男 / Male` or `女 / Female`; unrecognized values pass through.
pub fn gender_label(gender: &str) -> String {
    match gender.trim().to_lowercase().as_str() {
        "male" | "m" | "男" => "男 / Male".to_string(),
        "female" | "f" | "女" => "女 / Female".to_string(),
        _ => gender.to_string(),
    }
}

pub fn boat_label(boat: BoatChoice) -> &'static str {
    match boat {
        BoatChoice::Yes => "是 / Yes",
        BoatChoice::No => "否 / No",
    }
}

/// Export cell for one entry: `{option} - {name} ({gender}) {date}`.
pub fn export_cell(entry: &SpiritEntry) -> String {
    let gender = gender_label(&entry.gender);
    let gender_short = gender.split(' ').next().unwrap_or_default();
    format!(
        "{} - {} ({}) {}",
        option_label(&entry.option),
        entry.name_cn,
        gender_short,
        label_date(entry)
    )
}
