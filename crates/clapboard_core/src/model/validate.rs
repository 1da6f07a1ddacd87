//! Shared field validators composed by every entity.
//!
//! # Responsibility
//! - Turn loosely-typed identifier and timestamp input into canonical values.
//! - Provide the text/hex normalizers used by entity setters.
//!
//! # Invariants
//! - Validators are pure: no clock reads, no I/O.
//! - Timestamps leave this module truncated to microsecond precision, which
//!   matches the `DATETIME(6)` storage column.
//! - Every failure is a `ValidationError` tagged with the field it came from.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use crate::error::ErrorKind;

/// Result type for entity validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Accepted naive date-time layouts, tried in order after RFC 3339.
const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| {
    // A tag opens only at `<` followed by a non-space; unterminated tags run
    // to the end of the input.
    Regex::new(r"<[^\s>][^>]*(?:>|$)").expect("markup tag regex must compile")
});

/// Validation failure for one entity field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Malformed or insecure input.
    InvalidFormat { field: &'static str, message: String },
    /// Length or size out of bounds.
    RangeViolation { field: &'static str, message: String },
    /// Input of the wrong kind was handed to a validator.
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

impl ValidationError {
    pub(crate) fn invalid_format(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn range_violation(field: &'static str, message: impl Into<String>) -> Self {
        Self::RangeViolation {
            field,
            message: message.into(),
        }
    }

    /// Returns the taxonomy kind of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::RangeViolation { .. } => ErrorKind::RangeViolation,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
        }
    }

    /// Name of the field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidFormat { field, .. }
            | Self::RangeViolation { field, .. }
            | Self::TypeMismatch { field, .. } => field,
        }
    }

    /// Re-tags the error with the entity field that owns the value.
    pub fn in_field(self, field: &'static str) -> Self {
        match self {
            Self::InvalidFormat { message, .. } => Self::InvalidFormat { field, message },
            Self::RangeViolation { message, .. } => Self::RangeViolation { field, message },
            Self::TypeMismatch {
                expected, found, ..
            } => Self::TypeMismatch {
                field,
                expected,
                found,
            },
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat { field, message } => write!(f, "invalid {field}: {message}"),
            Self::RangeViolation { field, message } => {
                write!(f, "{field} out of range: {message}")
            }
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => write!(f, "{field} expects {expected}, got {found}"),
        }
    }
}

impl Error for ValidationError {}

/// Loosely-typed identifier input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidInput<'a> {
    /// Already-canonical identifier.
    Id(Uuid),
    /// Textual form (hyphenated, simple, braced or urn).
    Text(&'a str),
    /// 16-byte binary form, as stored.
    Bytes(&'a [u8]),
    /// Anything else; carries a description of what was supplied.
    Other(&'static str),
}

impl From<Uuid> for UuidInput<'_> {
    fn from(value: Uuid) -> Self {
        Self::Id(value)
    }
}

impl From<&Uuid> for UuidInput<'_> {
    fn from(value: &Uuid) -> Self {
        Self::Id(*value)
    }
}

impl<'a> From<&'a str> for UuidInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for UuidInput<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for UuidInput<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Bytes(value)
    }
}

impl<'a> From<&'a Value> for UuidInput<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text.as_str()),
            other => Self::Other(json_kind(other)),
        }
    }
}

/// Loosely-typed timestamp input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampInput<'a> {
    /// Already-parsed UTC instant.
    At(DateTime<Utc>),
    /// Textual date-time; naive forms are read as UTC.
    Text(&'a str),
    /// Anything else; carries a description of what was supplied.
    Other(&'static str),
}

impl From<DateTime<Utc>> for TimestampInput<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        Self::At(value)
    }
}

impl From<NaiveDateTime> for TimestampInput<'_> {
    fn from(value: NaiveDateTime) -> Self {
        Self::At(value.and_utc())
    }
}

impl<'a> From<&'a str> for TimestampInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for TimestampInput<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value.as_str())
    }
}

impl<'a> From<&'a Value> for TimestampInput<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text.as_str()),
            other => Self::Other(json_kind(other)),
        }
    }
}

/// Validates an identifier from canonical, binary or textual input.
///
/// # Errors
/// - `InvalidFormat` when text or bytes do not form a UUID.
/// - `TypeMismatch` when the input is neither an identifier nor text/bytes.
pub fn validate_uuid<'a>(input: impl Into<UuidInput<'a>>) -> ValidationResult<Uuid> {
    match input.into() {
        UuidInput::Id(id) => Ok(id),
        UuidInput::Text(text) => Uuid::parse_str(text.trim()).map_err(|err| {
            ValidationError::invalid_format("uuid", format!("not a valid uuid: {err}"))
        }),
        UuidInput::Bytes(bytes) => Uuid::from_slice(bytes).map_err(|_| {
            ValidationError::invalid_format(
                "uuid",
                format!("expected 16 bytes, got {}", bytes.len()),
            )
        }),
        UuidInput::Other(found) => Err(ValidationError::TypeMismatch {
            field: "uuid",
            expected: "uuid or string",
            found,
        }),
    }
}

/// Validates a timestamp from an instant or a textual date-time.
///
/// Absent input is not handled here; entities substitute the current time.
///
/// # Errors
/// - `InvalidFormat` when text cannot be parsed or names a date that does not
///   exist (for example `2024-02-30`).
/// - `TypeMismatch` when the input is neither an instant nor text.
pub fn validate_timestamp<'a>(
    input: impl Into<TimestampInput<'a>>,
) -> ValidationResult<DateTime<Utc>> {
    match input.into() {
        TimestampInput::At(at) => Ok(at.trunc_subsecs(6)),
        TimestampInput::Text(text) => parse_timestamp_text(text.trim())
            .map(|at| at.trunc_subsecs(6))
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "timestamp",
                    format!("`{}` is not a valid date-time", truncate_chars(text, 40)),
                )
            }),
        TimestampInput::Other(found) => Err(ValidationError::TypeMismatch {
            field: "timestamp",
            expected: "date-time or string",
            found,
        }),
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Trims text and strips markup tags and NUL bytes.
pub fn sanitize_text(raw: &str) -> String {
    let stripped = MARKUP_TAG.replace_all(raw.trim(), "");
    stripped.replace('\0', "").trim().to_string()
}

/// Sanitizes free text and enforces a non-empty, bounded character length.
pub(crate) fn bounded_text(
    raw: &str,
    field: &'static str,
    max_chars: usize,
) -> ValidationResult<String> {
    let clean = sanitize_text(raw);
    if clean.is_empty() {
        return Err(ValidationError::invalid_format(
            field,
            "value is empty or insecure",
        ));
    }
    let length = clean.chars().count();
    if length > max_chars {
        return Err(ValidationError::range_violation(
            field,
            format!("{length} characters exceeds maximum of {max_chars}"),
        ));
    }
    Ok(clean)
}

/// Trims and lowercases a hex string, requiring an exact length.
///
/// # Errors
/// - `InvalidFormat` when the value is empty or holds non-hex characters.
/// - `RangeViolation` when the hex string has the wrong length.
pub fn normalize_hex(raw: &str, field: &'static str, length: usize) -> ValidationResult<String> {
    let value = raw.trim().to_ascii_lowercase();
    if value.is_empty() {
        return Err(ValidationError::invalid_format(field, "value is empty"));
    }
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::invalid_format(
            field,
            "value must be hexadecimal",
        ));
    }
    if value.len() != length {
        return Err(ValidationError::range_violation(
            field,
            format!("expected {length} hex characters, got {}", value.len()),
        ));
    }
    Ok(value)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut out = value.chars().take(max_chars).collect::<String>();
    if value.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}
