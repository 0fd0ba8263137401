//! Input rules for account fields

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Result, ServiceError};

/// Longest accepted email address
pub const MAX_EMAIL_LENGTH: usize = 254;
/// Shortest accepted password
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Longest accepted password
pub const MAX_PASSWORD_LENGTH: usize = 128;

const MIN_PHONE_LENGTH: usize = 8;
const MAX_PHONE_LENGTH: usize = 15;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile email regex")
    })
}

/// Canonical form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trimmed, non-blank display name
pub fn name(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::Validation("Name is required".to_string()));
    }
    Ok(value.to_string())
}

/// Normalized email address
pub fn email(value: &str) -> Result<String> {
    let value = normalize_email(value);
    if value.is_empty() {
        return Err(ServiceError::Validation("Email is required".to_string()));
    }
    if value.len() > MAX_EMAIL_LENGTH || !email_regex().is_match(&value) {
        return Err(ServiceError::Validation("Invalid email address".to_string()));
    }
    Ok(value)
}

/// Password length check; the password itself is never trimmed
pub fn password(value: &str) -> Result<()> {
    let length = value.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(ServiceError::Validation(format!(
            "Password must be {MIN_PASSWORD_LENGTH}-{MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Trimmed phone number; empty is allowed
pub fn phone(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(String::new());
    }

    let well_formed = value.chars().all(|c| c.is_ascii_digit() || c == '+')
        && (MIN_PHONE_LENGTH..=MAX_PHONE_LENGTH).contains(&value.len());
    if !well_formed {
        return Err(ServiceError::Validation("Invalid phone number".to_string()));
    }
    Ok(value.to_string())
}
