//! Persistence gateways for profiles, stories and claps.
//!
//! # Responsibility
//! - Define one repository contract per entity plus its SQLite implementation.
//! - Keep SQL, column codecs and schema checks inside this boundary.
//!
//! # Invariants
//! - Writes accept only already-validated entities.
//! - Reads rebuild entities through their validating factories; a row that
//!   fails validation is reported as `InvalidData`, never masked.
//! - Every `RepoError` is a `StorageFailure`; nothing here retries.
//! - Lookups report "not found" as `None` or an empty `Vec`.

pub mod clap_repo;
pub mod profile_repo;
pub mod story_repo;

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::error::ErrorKind;
use crate::model::validate::validate_uuid;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, error};
use rusqlite::{Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Storage layout of `DATETIME(6)` columns, always UTC.
const TIMESTAMP_DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TIMESTAMP_DB_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub type RepoResult<T> = Result<T, RepoError>;

/// Failure at the store boundary.
#[derive(Debug)]
pub enum RepoError {
    /// Driver or connection failure, including constraint violations.
    Db(DbError),
    /// A stored row cannot be turned back into a valid entity.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Always `StorageFailure`; the variant carries the underlying cause.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::StorageFailure
    }

    /// Returns whether the store rejected the write on a UNIQUE, FOREIGN KEY
    /// or CHECK constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_constraint_violation())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "storage failure: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Verifies the connection is migrated and `table` has every `column`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }
    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Reads a 16-byte BLOB identifier column.
pub(crate) fn uuid_column(row: &Row<'_>, table: &str, column: &str) -> RepoResult<Uuid> {
    let bytes: Vec<u8> = row.get(column)?;
    validate_uuid(bytes.as_slice())
        .map_err(|err| RepoError::InvalidData(format!("{table}.{column}: {err}")))
}

pub(crate) fn timestamp_to_db(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_DB_FORMAT).to_string()
}

/// Reads a `DATETIME(6)` text column as UTC.
pub(crate) fn timestamp_column(
    row: &Row<'_>,
    table: &str,
    column: &str,
) -> RepoResult<DateTime<Utc>> {
    let text: String = row.get(column)?;
    NaiveDateTime::parse_from_str(&text, TIMESTAMP_DB_PARSE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            RepoError::InvalidData(format!("invalid timestamp `{text}` in {table}.{column}"))
        })
}

/// Escapes SQLite GLOB metacharacters so `text` matches literally.
pub(crate) fn escape_glob(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '*' => escaped.push_str("[*]"),
            '?' => escaped.push_str("[?]"),
            '[' => escaped.push_str("[[]"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Emits one metadata-only log line for a gateway call.
pub(crate) fn log_outcome<T>(
    event: &str,
    subject: &dyn Display,
    started_at: Instant,
    result: &RepoResult<T>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => debug!(
            "event={event} module=repo status=ok subject={subject} duration_ms={duration_ms}"
        ),
        Err(err) => error!(
            "event={event} module=repo status=error subject={subject} duration_ms={duration_ms} constraint={} error={err}",
            err.is_constraint_violation()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_glob, timestamp_to_db};
    use chrono::DateTime;

    #[test]
    fn escape_glob_brackets_every_metacharacter() {
        assert_eq!(escape_glob("a*b?c[d]"), "a[*]b[?]c[[]d]");
        assert_eq!(escape_glob("plain text"), "plain text");
    }

    #[test]
    fn timestamps_are_stored_with_six_fraction_digits() {
        let at = DateTime::from_timestamp(1_700_000_000, 5_000).unwrap();
        assert_eq!(timestamp_to_db(&at), "2023-11-14 22:13:20.000005");
    }
}
