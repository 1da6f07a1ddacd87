//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Resolve store location and logging settings from `CLAPBOARD_*` variables.
//!
//! # Invariants
//! - Unset and blank variables fall back to defaults; nothing here panics.
//! - A missing database path means a private in-memory store.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, normalize_level};
use rusqlite::Connection;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "CLAPBOARD_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CLAPBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CLAPBOARD_LOG_DIR";

/// Runtime settings for the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file; `None` opens an in-memory store.
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    /// Directory for rolling logs; `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// - Returns an error when the log level is not a known level name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(level) => normalize_level(&level)?,
            None => default_log_level(),
        };

        Ok(Self {
            db_path: read(ENV_DB_PATH).map(PathBuf::from),
            log_level,
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        })
    }

    /// Opens the configured store with migrations applied.
    pub fn open_db(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when no directory is set.
    pub fn init_logging(&self) -> Result<bool, String> {
        match &self.log_dir {
            Some(dir) => init_logging(self.log_level, dir).map(|()| true),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = CoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let config =
            CoreConfig::from_lookup(lookup_from(&[(ENV_DB_PATH, "  "), (ENV_LOG_DIR, "")]))
                .unwrap();
        assert_eq!(config.db_path, None);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn reads_all_keys() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/tmp/clapboard.sqlite3"),
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_LOG_DIR, "/tmp/clapboard-logs"),
        ]))
        .unwrap();
        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/tmp/clapboard.sqlite3"))
        );
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/clapboard-logs")));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_LOG_LEVEL, "chatty")])).unwrap_err();
        assert!(err.contains("unsupported log level"));
    }

    #[test]
    fn in_memory_store_opens_without_logging() {
        let config = CoreConfig::default();
        assert!(!config.init_logging().unwrap());
        assert!(config.open_db().is_ok());
    }
}
