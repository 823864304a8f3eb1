//! Field validation for model payloads.
//!
//! SQLite only enforces NOT NULL and foreign keys for us; the remaining
//! invariants (non-negative money, bounded ratings, well-formed emails) are
//! checked here before any write reaches the database.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Longest free-text value accepted for names and titles.
pub const MAX_NAME_LEN: usize = 200;

/// Longest free-text value accepted for notes and descriptions.
pub const MAX_NOTES_LEN: usize = 10_000;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be a finite, non-negative amount")]
    InvalidAmount { field: &'static str },

    #[error("{field} cannot be negative")]
    NegativeCount { field: &'static str },

    #[error("deposit_amount cannot exceed amount")]
    DepositExceedsAmount,

    #[error("rating must be between 0 and 5")]
    RatingOutOfRange,

    #[error("ends_at must not be before starts_at")]
    EndsBeforeStart,

    #[error("invalid email address: '{0}'")]
    InvalidEmail(String),
}

/// Require a non-blank string no longer than `max` characters.
pub fn require_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    check_len(field, value, max)
}

/// Validate an optional string; `None` always passes.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => check_len(field, value, max),
        None => Ok(()),
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        Err(ValidationError::TooLong { field, max })
    } else {
        Ok(())
    }
}

pub fn amount(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidAmount { field })
    }
}

pub fn optional_amount(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| amount(field, v))
}

pub fn optional_count(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < 0 => Err(ValidationError::NegativeCount { field }),
        _ => Ok(()),
    }
}

pub fn deposit_within_amount(amount: f64, deposit: f64) -> Result<(), ValidationError> {
    if deposit > amount {
        Err(ValidationError::DepositExceedsAmount)
    } else {
        Ok(())
    }
}

pub fn optional_rating(value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(r) if !(0.0..=5.0).contains(&r) => Err(ValidationError::RatingOutOfRange),
        _ => Ok(()),
    }
}

pub fn time_range(
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match ends_at {
        Some(end) if end < starts_at => Err(ValidationError::EndsBeforeStart),
        _ => Ok(()),
    }
}

/// Loose shape check: one `@`, non-empty local part, dotted domain.
pub fn optional_email(value: Option<&str>) -> Result<(), ValidationError> {
    let Some(email) = value else {
        return Ok(());
    };
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}
