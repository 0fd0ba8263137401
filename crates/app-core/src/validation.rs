//! Field validation rules
//!
//! Rules are attached to field names, so a `nik` field is checked the same
//! way on every form it appears in.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{CoreError, Result};

/// A validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    /// Non-blank after trimming
    Required,
    /// At least this many characters
    MinLength(usize),
    /// National id: 16 digits
    Nik,
    /// Tax id: 15 or 16 digits
    Npwp,
    /// Business registration number: 13 digits
    Nib,
    /// Business classification code: 5 digits
    Kbli,
    /// Email address
    Email,
    /// Indonesian mobile number
    Phone,
    /// Integer greater than zero
    PositiveNumber,
    /// 0 to 100
    Percentage,
    /// Applied to a field's name: not one of the submission metadata keys
    ReservedName,
}

impl Rule {
    /// Whether `value` satisfies this rule
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Rule::Required => !value.trim().is_empty(),
            Rule::MinLength(min) => value.chars().count() >= min,
            Rule::Nik => is_digits(value, &[16]),
            Rule::Npwp => is_digits(value, &[15, 16]),
            Rule::Nib => is_digits(value, &[13]),
            Rule::Kbli => is_digits(value, &[5]),
            Rule::Email => email_regex().is_match(value),
            Rule::Phone => phone_regex().is_match(value),
            Rule::PositiveNumber => value.parse::<u64>().is_ok_and(|n| n > 0),
            Rule::Percentage => value.parse::<u8>().is_ok_and(|n| n <= 100),
            Rule::ReservedName => !RESERVED_FIELDS.contains(&value),
        }
    }

    /// Catalog id of the message describing this failure
    pub fn message_id(self) -> &'static str {
        match self {
            Rule::Required => "error-required",
            Rule::MinLength(_) => "error-too-short",
            Rule::Nik => "error-nik",
            Rule::Npwp => "error-npwp",
            Rule::Nib => "error-nib",
            Rule::Kbli => "error-kbli",
            Rule::Email => "error-email",
            Rule::Phone => "error-phone",
            Rule::PositiveNumber => "error-positive-number",
            Rule::Percentage => "error-percentage",
            Rule::ReservedName => "error-reserved-field",
        }
    }
}

/// Keys a stored submission uses for its own metadata
pub const RESERVED_FIELDS: [&str; 4] = ["id", "type", "status", "submittedAt"];

fn is_digits(value: &str, lengths: &[usize]) -> bool {
    lengths.contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

fn phone_regex() -> &'static Regex {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    PHONE_REGEX.get_or_init(|| Regex::new(r"^(\+62|62|0)8\d{7,11}$").expect("phone pattern is valid"))
}

/// Format rule applied to a field wherever it appears
pub fn rule_for_field(field: &str) -> Option<Rule> {
    match field {
        "nik" => Some(Rule::Nik),
        "npwp" => Some(Rule::Npwp),
        "nib" => Some(Rule::Nib),
        "kbli" => Some(Rule::Kbli),
        "email" => Some(Rule::Email),
        "phone" => Some(Rule::Phone),
        "amount" | "revenue" | "employees" => Some(Rule::PositiveNumber),
        _ => None,
    }
}

/// Trimmed `value`, or a `Required` failure when it is blank
pub fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(field, Rule::Required));
    }
    Ok(trimmed)
}

/// Check `value` against `rule`
pub fn check(field: &str, value: &str, rule: Rule) -> Result<()> {
    if rule.accepts(value) {
        Ok(())
    } else {
        Err(CoreError::validation(field, rule))
    }
}

/// Check `value` against the field's format rule, if it has one
pub fn check_field(field: &str, value: &str) -> Result<()> {
    match rule_for_field(field) {
        Some(rule) => check(field, value, rule),
        None => Ok(()),
    }
}
