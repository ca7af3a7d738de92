//! Phone number handling: duplicate keys, order codes and WhatsApp numbers.

use crate::error::{GhostfestError, Result};

/// Digits kept for duplicate matching.
const LOCAL_DIGITS: usize = 8;
/// Digits in a public order code.
const ORDER_CODE_DIGITS: usize = 4;

fn digits(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn last_n(s: &str, n: usize) -> &str {
    // `s` is ASCII digits only, so byte slicing is safe.
    &s[s.len().saturating_sub(n)..]
}

/// Last 8 digits of the number, ignoring spaces, dashes and the country
/// prefix separator. Shorter numbers are returned whole.
pub fn local_phone(phone: &str) -> String {
    last_n(&digits(phone), LOCAL_DIGITS).to_string()
}

/// The 4-digit public lookup code for a phone number.
pub fn order_code(phone: &str) -> Result<String> {
    let d = digits(phone);
    if d.len() < ORDER_CODE_DIGITS {
        return Err(GhostfestError::validation(
            "phone",
            format!("phone number needs at least {ORDER_CODE_DIGITS} digits"),
        ));
    }
    Ok(last_n(&d, ORDER_CODE_DIGITS).to_string())
}

/// Stored form of a phone number: country code followed by the number.
pub fn full_phone(country_code: &str, phone: &str) -> String {
    format!("{}{}", country_code.trim(), phone.trim())
}

/// Number as `wa.me` expects it: no plus sign, no spaces.
pub fn whatsapp_number(phone: &str) -> String {
    phone.replace(['+', ' '], "")
}

/// True when `code` is exactly four ASCII digits.
pub fn is_valid_order_code(code: &str) -> bool {
    let code = code.trim();
    code.len() == ORDER_CODE_DIGITS && code.chars().all(|c| c.is_ascii_digit())
}
