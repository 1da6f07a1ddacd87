//! Validation and persistence core for Clapboard profiles, stories and claps.
//! This crate is the single source of truth for entity invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::clap::{Clap, ClapId, ClapWire};
pub use model::profile::{Profile, ProfileId, ProfileWire};
pub use model::story::{Story, StoryId, StoryWire};
pub use model::validate::{
    validate_timestamp, validate_uuid, TimestampInput, UuidInput, ValidationError,
    ValidationResult,
};
pub use repo::clap_repo::{ClapRepository, SqliteClapRepository};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::story_repo::{SqliteStoryRepository, StoryRepository};
pub use repo::{RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
