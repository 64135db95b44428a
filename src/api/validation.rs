//! Input validation for API requests.
//!
//! This module provides validation functions for API request data,
//! ensuring all inputs meet the required format and constraints.
//!
//! For collecting multiple validation errors and returning them as an ApiError,
//! use the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use lettre::message::Mailbox;
use regex::Regex;

use super::error::{ApiError, ValidationErrorBuilder};

lazy_static! {
    /// Pragmatic email check: something@something.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    ).unwrap();

    /// Absolute HTTP/HTTPS URL
    static ref HTTP_URL_REGEX: Regex = Regex::new(
        r"^https?://[a-zA-Z0-9][-a-zA-Z0-9.]*(:\d+)?(/\S*)?$"
    ).unwrap();

    /// Site-relative path such as /uploads/abc.jpg or /donate
    static ref SITE_PATH_REGEX: Regex = Regex::new(
        r"^/[-a-zA-Z0-9_./%#?=&]*$"
    ).unwrap();

    /// ISO calendar date (YYYY-MM-DD)
    static ref DATE_REGEX: Regex = Regex::new(
        r"^\d{4}-\d{2}-\d{2}$"
    ).unwrap();

    /// Settings keys: lowercase identifiers
    static ref SETTING_KEY_REGEX: Regex = Regex::new(
        r"^[a-z][a-z0-9_]*$"
    ).unwrap();
}

/// Parse a record id from a path segment
pub fn parse_id(raw: &str, field: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::validation_field(
            field,
            format!("{field} must be a positive integer"),
        )),
    }
}

/// Validate a required text field
pub fn validate_required(value: &str, label: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{label} is required"));
    }

    if value.chars().count() > max_len {
        return Err(format!("{label} is too long (max {max_len} characters)"));
    }

    Ok(())
}

/// Validate an optional text field's length
pub fn validate_optional(value: &Option<String>, label: &str, max_len: usize) -> Result<(), String> {
    if let Some(v) = value {
        if v.chars().count() > max_len {
            return Err(format!("{label} is too long (max {max_len} characters)"));
        }
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    // The address ends up in a Reply-To header, so it must parse as a mailbox too
    if !EMAIL_REGEX.is_match(email) || email.parse::<Mailbox>().is_err() {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a link or image location: absolute http(s) URL or site-relative path
pub fn validate_link(link: &str) -> Result<(), String> {
    if link.len() > 2048 {
        return Err("URL is too long (max 2048 characters)".to_string());
    }

    if link.starts_with("//") {
        return Err("Protocol-relative URLs are not allowed".to_string());
    }

    if HTTP_URL_REGEX.is_match(link) || SITE_PATH_REGEX.is_match(link) {
        return Ok(());
    }

    Err("Must be an http(s) URL or a path starting with '/'".to_string())
}

/// Validate an optional link; empty strings are treated as absent
pub fn validate_optional_link(link: &Option<String>) -> Result<(), String> {
    match link {
        Some(l) if !l.is_empty() => validate_link(l),
        _ => Ok(()),
    }
}

/// Validate an optional ISO date
pub fn validate_date(date: &Option<String>) -> Result<(), String> {
    if let Some(d) = date {
        if d.is_empty() {
            return Ok(());
        }

        if !DATE_REGEX.is_match(d) || chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").is_err() {
            return Err("Date must be in YYYY-MM-DD format".to_string());
        }
    }

    Ok(())
}

/// Validate an optional RFC 3339 timestamp; a plain YYYY-MM-DD date is also accepted
pub fn validate_timestamp(timestamp: &Option<String>) -> Result<(), String> {
    match timestamp.as_deref() {
        None | Some("") => Ok(()),
        Some(t) if chrono::DateTime::parse_from_rfc3339(t).is_ok() => Ok(()),
        Some(t) => validate_date(&Some(t.to_string()))
            .map_err(|_| "Must be an RFC 3339 timestamp or a YYYY-MM-DD date".to_string()),
    }
}

/// Validate a value against a fixed set of choices
pub fn validate_choice(value: &str, choices: &[&str]) -> Result<(), String> {
    if choices.contains(&value) {
        Ok(())
    } else {
        Err(format!("Must be one of: {}", choices.join(", ")))
    }
}

/// Validate a settings key
pub fn validate_setting_key(key: &str) -> Result<(), String> {
    if key.is_empty() || key.len() > 100 {
        return Err("Setting keys must be 1-100 characters".to_string());
    }

    if !SETTING_KEY_REGEX.is_match(key) {
        return Err("Setting keys must be lowercase letters, digits and underscores".to_string());
    }

    Ok(())
}

/// Record a field error on the builder if `result` failed
pub fn check(errors: &mut ValidationErrorBuilder, field: &str, result: Result<(), String>) {
    if let Err(e) = result {
        errors.add(field, e);
    }
}
