//! Domain model for profiles, stories and claps.
//!
//! # Responsibility
//! - Define the three validated entities and their wire projections.
//! - Share field validators through `validate` instead of per-entity copies.
//!
//! # Invariants
//! - Entities are built only through validating factories; no half-valid
//!   value is ever observable.
//! - Wire timestamps are epoch milliseconds rounded from microseconds.

pub mod clap;
pub mod profile;
pub mod story;
pub mod validate;

use chrono::{DateTime, SubsecRound, Utc};
use validate::{validate_timestamp, TimestampInput, ValidationError, ValidationResult};

/// Converts an instant to epoch milliseconds, rounding half away from zero.
pub(crate) fn to_epoch_millis(at: &DateTime<Utc>) -> i64 {
    let micros = at.timestamp_micros();
    if micros >= 0 {
        (micros + 500) / 1000
    } else {
        (micros - 500) / 1000
    }
}

/// Converts wire epoch milliseconds back into an instant.
pub(crate) fn from_epoch_millis(
    millis: i64,
    field: &'static str,
) -> ValidationResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        ValidationError::range_violation(
            field,
            format!("{millis} ms is outside the supported range"),
        )
    })
}

/// Validates an optional timestamp, substituting the current instant when absent.
///
/// Errors are tagged with `field`.
pub(crate) fn resolve_timestamp(
    input: Option<TimestampInput<'_>>,
    field: &'static str,
) -> ValidationResult<DateTime<Utc>> {
    match input {
        None => Ok(Utc::now().trunc_subsecs(6)),
        Some(input) => validate_timestamp(input).map_err(|err| err.in_field(field)),
    }
}
