//! Admin listing: filtering, pagination and statistics.
//!
//! The record set is small enough that every dashboard request loads all
//! submissions and filters in memory. Entry-level filters look inside the
//! entries JSON, which SQL cannot do without a JSON1 dependency.

use crate::config::{DashboardConfig, local_now};
use crate::entries::{label_date, normalize_gender, GenderBucket};
use crate::models::{BoatChoice, EnrichedEntry, PaymentMethod, Submission};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Listing parameters as sent by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardQuery {
    pub page: usize,
    pub per_page: usize,
    pub search: String,
    pub filter_type: String,
    pub filter_value: String,
}

impl Default for DashboardQuery {
    fn default() -> Self {
        Self {
            page: DashboardConfig::DEFAULT_PAGE,
            per_page: DashboardConfig::DEFAULT_PER_PAGE,
            search: String::new(),
            filter_type: String::new(),
            filter_value: String::new(),
        }
    }
}

impl DashboardQuery {
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    pub fn per_page(&self) -> usize {
        self.per_page.clamp(1, DashboardConfig::MAX_PER_PAGE)
    }

    /// True when the submission should be listed.
    pub fn matches(&self, submission: &Submission) -> bool {
        let filter_type = self.filter_type.trim();
        let filter_value = self.filter_value.trim();
        if !filter_type.is_empty() && !filter_value.is_empty() {
            return matches_filter(submission, filter_type, filter_value);
        }
        let search = self.search.trim();
        search.is_empty() || general_search(submission, search)
    }
}

/// Apply one `filter_type`/`filter_value` pair.
pub fn matches_filter(submission: &Submission, filter_type: &str, value: &str) -> bool {
    match filter_type {
        "option" => submission.entries.iter().any(|e| e.option == value),
        "paid" => match value.to_lowercase().as_str() {
            "paid" => submission.paid,
            "unpaid" => !submission.paid,
            _ => true,
        },
        "gender" => submission.gender == value,
        "name" => {
            let needle = value.to_lowercase();
            contains_ci(&submission.name_cn, &needle)
                || contains_ci(&submission.name_en, &needle)
                || submission
                    .entries
                    .iter()
                    .any(|e| contains_ci(&e.name_cn, &needle))
        }
        "date" => submission.entries.iter().any(|e| {
            label_date(e).contains(value)
                || e.year.contains(value)
                || e.month.contains(value)
                || e.day.contains(value)
        }),
        _ => general_search(submission, value),
    }
}

/// Case-insensitive substring match on order code, names and phone.
pub fn general_search(submission: &Submission, value: &str) -> bool {
    let needle = value.to_lowercase();
    [
        &submission.order_id,
        &submission.name_cn,
        &submission.name_en,
        &submission.phone,
    ]
    .into_iter()
    .any(|field| contains_ci(field, &needle))
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

/// Page metadata for the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_num: usize,
    pub next_num: usize,
}

impl Pagination {
    pub fn new(page: usize, per_page: usize, total: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let pages = total.div_ceil(per_page);
        Self {
            page,
            per_page,
            total,
            pages,
            has_prev: page > 1,
            has_next: page < pages,
            prev_num: page - 1,
            next_num: page.saturating_add(1),
        }
    }

    /// Slice out this page. A page past the end yields nothing.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let start = (self.page - 1).saturating_mul(self.per_page);
        items.into_iter().skip(start).take(self.per_page).collect()
    }
}

/// Per-option entry counts split by gender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionStat {
    pub total: u32,
    pub male: u32,
    pub female: u32,
    pub unknown: u32,
}

impl OptionStat {
    fn record(&mut self, gender: GenderBucket) {
        self.total += 1;
        match gender {
            GenderBucket::Male => self.male += 1,
            GenderBucket::Female => self.female += 1,
            GenderBucket::Unknown => self.unknown += 1,
        }
    }
}

/// Tally every entry of every submission by trimmed option label.
pub fn option_stats(submissions: &[Submission]) -> BTreeMap<String, OptionStat> {
    let mut stats: BTreeMap<String, OptionStat> = BTreeMap::new();
    for entry in submissions.iter().flat_map(|s| s.entries.iter()) {
        stats
            .entry(entry.option.trim().to_string())
            .or_default()
            .record(normalize_gender(&entry.gender));
    }
    stats
}

/// Distinct values offered by the dashboard's filter dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterValues {
    pub order_id: Vec<String>,
    pub boat: Vec<String>,
    pub gender: Vec<String>,
    pub name: Vec<String>,
    pub phone: Vec<String>,
    pub payment_method: Vec<String>,
    pub option: Vec<String>,
    pub date: Vec<String>,
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

pub fn filter_values(submissions: &[Submission]) -> FilterValues {
    let mut name = distinct(submissions.iter().map(|s| s.name_cn.as_str()));
    name.extend(distinct(submissions.iter().map(|s| s.name_en.as_str())));

    let entries = || submissions.iter().flat_map(|s| s.entries.iter());
    let option: BTreeSet<String> = entries().map(|e| e.option.clone()).collect();
    let date: BTreeSet<String> = entries()
        .map(|e| {
            let label = label_date(e);
            if label.is_empty() {
                DashboardConfig::UNKNOWN_DATE_LABEL.to_string()
            } else {
                label
            }
        })
        .collect();

    FilterValues {
        order_id: distinct(submissions.iter().map(|s| s.order_id.as_str())),
        boat: distinct(submissions.iter().map(|s| s.boat.as_str())),
        gender: distinct(submissions.iter().map(|s| s.gender.as_str())),
        name,
        phone: distinct(submissions.iter().map(|s| s.phone.as_str())),
        payment_method: distinct(submissions.iter().map(|s| s.payment_method.as_str())),
        option: option.into_iter().collect(),
        date: date.into_iter().collect(),
    }
}

/// A submission as shown in the dashboard table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub id: i64,
    pub order_id: String,
    pub name_cn: String,
    pub name_en: String,
    pub gender: String,
    pub boat: BoatChoice,
    pub phone: String,
    pub paid: bool,
    pub count: u32,
    pub total: i64,
    pub payment_method: PaymentMethod,
    pub payment_amount: i64,
    pub remarks: String,
    pub date: String,
    pub entries: Vec<EnrichedEntry>,
}

impl From<&Submission> for OrderView {
    fn from(s: &Submission) -> Self {
        Self {
            id: s.id,
            order_id: s.order_id.clone(),
            name_cn: s.name_cn.clone(),
            name_en: s.name_en.clone(),
            gender: s.gender.clone(),
            boat: s.boat,
            phone: s.phone.clone(),
            paid: s.paid,
            count: s.count,
            total: s.total,
            payment_method: s.payment_method,
            payment_amount: s.payment_amount,
            remarks: s.remarks.clone(),
            date: s.date.format(DashboardConfig::ROW_DATE_FORMAT).to_string(),
            entries: s.enriched_entries(),
        }
    }
}

/// Everything the dashboard page needs in one response.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub orders: Vec<OrderView>,
    pub pagination: Pagination,
    pub search: String,
    pub filter_type: String,
    pub filter_value: String,
    pub num_orders: usize,
    pub total_paid: i64,
    pub total_order: i64,
    pub option_stats: BTreeMap<String, OptionStat>,
    pub filter_values: FilterValues,
    pub paused: bool,
    pub is_owner: bool,
    pub last_updated: String,
}

/// Build the dashboard from every stored submission, newest first.
pub fn build_dashboard(
    all: &[Submission],
    query: &DashboardQuery,
    paused: bool,
    is_owner: bool,
) -> DashboardView {
    let matching: Vec<&Submission> = all.iter().filter(|s| query.matches(s)).collect();
    let pagination = Pagination::new(query.page(), query.per_page(), matching.len());
    let orders = pagination
        .slice(matching)
        .into_iter()
        .map(OrderView::from)
        .collect();

    DashboardView {
        orders,
        pagination,
        search: query.search.trim().to_string(),
        filter_type: query.filter_type.clone(),
        filter_value: query.filter_value.trim().to_string(),
        num_orders: all.len(),
        total_paid: all.iter().filter(|s| s.paid).map(|s| s.payment_amount).sum(),
        total_order: all.iter().map(|s| s.total).sum(),
        option_stats: option_stats(all),
        filter_values: filter_values(all),
        paused,
        is_owner,
        last_updated: local_now()
            .format(DashboardConfig::LAST_UPDATED_FORMAT)
            .to_string(),
    }
}
