//! Entry pricing.

use crate::config::PricingConfig;
use crate::models::BoatChoice;

/// Entries covered by the boat seat.
pub fn free_allowance(boat: BoatChoice) -> u32 {
    if boat.is_yes() {
        PricingConfig::FREE_ENTRIES_WITH_BOAT
    } else {
        0
    }
}

/// Amount due for a registration: `max(0, count - allowance) * unit price`.
pub fn compute_total(boat: BoatChoice, entry_count: usize) -> i64 {
    let chargeable = (entry_count as i64 - free_allowance(boat) as i64).max(0);
    chargeable * PricingConfig::UNIT_PRICE
}
