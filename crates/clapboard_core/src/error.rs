//! Caller-facing error taxonomy.
//!
//! # Responsibility
//! - Collapse model and repository failures into four stable kinds.
//!
//! # Invariants
//! - Validation failures never become `StorageFailure`.
//! - Every repository failure is `StorageFailure`, whatever its cause.

use crate::model::validate::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable failure kinds visible to API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidFormat,
    RangeViolation,
    TypeMismatch,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::RangeViolation => "range_violation",
            Self::TypeMismatch => "type_mismatch",
            Self::StorageFailure => "storage_failure",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Union of validation and storage failures for callers that mix both.
#[derive(Debug)]
pub enum CoreError {
    Validation(ValidationError),
    Storage(RepoError),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(err) => err.kind(),
            Self::Storage(err) => err.kind(),
        }
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}
