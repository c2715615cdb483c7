//! Reusable field rules.
//!
//! Each rule returns `Some(message)` when the value breaks it. Schemas chain them
//! with [`first_error`] and map `None` to the empty "valid" string.

use std::sync::LazyLock;

use regex::Regex;

/// Upper bound for currency-like fields
pub const MAX_AMOUNT: f64 = 99_999_999.99;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]{7,20}$").expect("Invalid phone regex"));

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("Invalid URL regex"));

/// First message of a chain of rule results
pub fn first_error<const N: usize>(checks: [Option<String>; N]) -> String {
    checks.into_iter().flatten().next().unwrap_or_default()
}

pub fn required(value: &str, message: &str) -> Option<String> {
    value.trim().is_empty().then(|| message.to_string())
}

/// Character count of the trimmed value within `min..=max`
pub fn length_between(value: &str, min: usize, max: usize, label: &str) -> Option<String> {
    let len = value.trim().chars().count();
    (len < min || len > max)
        .then(|| format!("{label} must be between {min} and {max} characters"))
}

pub fn max_length(value: &str, max: usize, label: &str) -> Option<String> {
    (value.trim().chars().count() > max)
        .then(|| format!("{label} must not exceed {max} characters"))
}

pub fn matches(value: &str, pattern: &Regex, message: &str) -> Option<String> {
    (!pattern.is_match(value.trim())).then(|| message.to_string())
}

pub fn email(value: &str) -> Option<String> {
    matches(value, &EMAIL, "Please enter a valid email address")
}

pub fn phone(value: &str) -> Option<String> {
    matches(value, &PHONE, "Please enter a valid phone number")
}

pub fn url(value: &str) -> Option<String> {
    matches(value, &URL, "URL must start with http:// or https://")
}

/// Parse a decimal amount; blank is `None`
pub fn parse_amount(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|amount| amount.is_finite())
}

/// A number strictly greater than zero and at most [`MAX_AMOUNT`]
pub fn positive_amount(value: &str, label: &str) -> Option<String> {
    match parse_amount(value) {
        None => Some(format!("{label} must be a valid number")),
        Some(amount) if amount <= 0.0 => Some(format!("{label} must be greater than 0")),
        Some(amount) if amount > MAX_AMOUNT => {
            Some(format!("{label} must not exceed 99,999,999.99"))
        }
        Some(_) => None,
    }
}

/// A number at least zero and at most [`MAX_AMOUNT`]
pub fn non_negative_amount(value: &str, label: &str) -> Option<String> {
    match parse_amount(value) {
        None => Some(format!("{label} must be a valid number")),
        Some(amount) if amount < 0.0 => Some(format!("{label} cannot be negative")),
        Some(amount) if amount > MAX_AMOUNT => {
            Some(format!("{label} must not exceed 99,999,999.99"))
        }
        Some(_) => None,
    }
}

/// A whole number within `min..=max`
pub fn integer_between(value: &str, min: i64, max: i64, label: &str) -> Option<String> {
    match value.trim().parse::<i64>() {
        Err(_) => Some(format!("{label} must be a whole number")),
        Ok(number) if number < min || number > max => {
            Some(format!("{label} must be between {min} and {max}"))
        }
        Ok(_) => None,
    }
}

/// Apply `rule` only when the value is not blank
pub fn optional(value: &str, rule: impl FnOnce(&str) -> Option<String>) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        rule(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_bounds() {
        assert!(positive_amount("0", "Price").is_some());
        assert!(positive_amount("0.01", "Price").is_none());
        assert!(positive_amount("99999999.99", "Price").is_none());
        assert!(positive_amount("100000000", "Price").is_some());
        assert!(positive_amount("abc", "Price").is_some());
        assert!(positive_amount("NaN", "Price").is_some());
        assert!(non_negative_amount("0", "Cost").is_none());
    }

    #[test]
    fn url_requires_scheme() {
        assert!(url("https://cdn.example.com/a.png").is_none());
        assert!(url("http://localhost/x").is_none());
        assert!(url("ftp://example.com").is_some());
        assert!(url("example.com/a.png").is_some());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(length_between("Été", 2, 3, "Name").is_none());
        assert!(length_between(" a ", 2, 50, "Name").is_some());
    }

    #[test]
    fn first_error_picks_earliest_failure() {
        let message = first_error([None, Some("second".to_string()), Some("third".to_string())]);
        assert_eq!(message, "second");
        assert_eq!(first_error([None, None]), "");
    }
}
