use validator::ValidateEmail;

use crate::error::{InnoventoryError, Result};

/// Trim a required field, rejecting blanks
pub fn required(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InnoventoryError::validation(field, "is required"));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional field; blank means unset
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Case-insensitive name comparison that folds non-ASCII letters too
pub fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Normalized (trimmed, lowercased) email
pub fn email(value: &str) -> Result<String> {
    let value = required("email", value)?.to_lowercase();
    if !value.validate_email() {
        return Err(InnoventoryError::validation(
            "email",
            format!("'{value}' is not a valid address"),
        ));
    }
    Ok(value)
}

/// At least one phone number; each needs 7-15 digits and only dialing characters
pub fn phones(values: &[String]) -> Result<Vec<String>> {
    let phones: Vec<String> = values
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if phones.is_empty() {
        return Err(InnoventoryError::validation(
            "phone",
            "at least one number is required",
        ));
    }
    for phone in &phones {
        let allowed = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
        let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
        if !allowed || !(7..=15).contains(&digits) {
            return Err(InnoventoryError::validation(
                "phone",
                format!("'{phone}' is not a valid number"),
            ));
        }
    }
    Ok(phones)
}

/// 15-character alphanumeric GSTIN, stored uppercase
pub fn gst_number(value: Option<&str>) -> Result<Option<String>> {
    let Some(value) = optional(value) else {
        return Ok(None);
    };
    let upper = value.to_uppercase();
    if upper.len() != 15 || !upper.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(InnoventoryError::validation(
            "gst_number",
            format!("'{value}' must be 15 letters or digits"),
        ));
    }
    Ok(Some(upper))
}

/// Lowercase login name of 3-32 characters from [a-z0-9_.-]
pub fn username(value: &str) -> Result<String> {
    let value = required("username", value)?.to_lowercase();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'));
    if !allowed || !(3..=32).contains(&value.len()) {
        return Err(InnoventoryError::validation(
            "username",
            "use 3-32 characters from a-z, 0-9, '_', '.', '-'",
        ));
    }
    Ok(value)
}

pub fn amount(field: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(InnoventoryError::validation(field, "must be zero or more"));
    }
    Ok(value)
}
