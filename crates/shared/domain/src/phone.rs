//! Phone number normalization and validation.
//!
//! Canonical numbers are Vietnamese mobiles: `+84` followed by nine digits.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{PHONE_COUNTRY_PREFIX, PHONE_PATTERN};

pub static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(PHONE_PATTERN).expect("phone pattern is a valid regex"));

/// Normalize user input into the canonical `+84xxxxxxxxx` form.
///
/// Non-digits are stripped, then a leading `0` or a bare `84` prefix is
/// replaced by `+84`. Anything else is assumed to be a local number.
/// The result is not guaranteed to be valid; check with [`is_valid_phone`].
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if let Some(rest) = digits.strip_prefix('0') {
        format!("{}{}", PHONE_COUNTRY_PREFIX, rest)
    } else if let Some(rest) = digits.strip_prefix("84") {
        format!("{}{}", PHONE_COUNTRY_PREFIX, rest)
    } else {
        format!("{}{}", PHONE_COUNTRY_PREFIX, digits)
    }
}

/// Check the canonical format.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// `+84912345678` -> `0912345678`; other inputs are returned unchanged.
pub fn to_local_format(phone: &str) -> String {
    match phone.strip_prefix(PHONE_COUNTRY_PREFIX) {
        Some(rest) => format!("0{}", rest),
        None => phone.to_string(),
    }
}
