//! Profile repository contract and SQLite implementation.
//!
//! # Invariants
//! - Handle and email uniqueness is enforced by the `profile` table; duplicate
//!   inserts fail as storage errors.
//! - Lookup inputs get the same sanitization as the matching setter.
//! - Credentials and activation tokens are never logged.

use crate::model::profile::{normalize_email, Profile, ProfileId};
use crate::model::validate::sanitize_text;
use crate::repo::{ensure_connection_ready, log_outcome, uuid_column, RepoError, RepoResult};
use log::warn;
use rusqlite::{params, Connection, Params, Row};
use std::time::Instant;

const PROFILE_COLUMNS: &[&str] = &[
    "id",
    "activation_token",
    "handle",
    "email",
    "credential_hash",
    "credential_salt",
];

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    activation_token,
    handle,
    email,
    credential_hash,
    credential_salt
FROM profile";

/// Repository interface for profile persistence.
pub trait ProfileRepository {
    fn insert_profile(&self, profile: &Profile) -> RepoResult<()>;
    /// Rewrites every mutable column of the row with the profile's id.
    fn update_profile(&self, profile: &Profile) -> RepoResult<()>;
    fn delete_profile(&self, id: ProfileId) -> RepoResult<()>;
    fn get_profile_by_id(&self, id: ProfileId) -> RepoResult<Option<Profile>>;
    /// Exact match after trimming, as `Profile::set_email` does.
    fn get_profile_by_email(&self, email: &str) -> RepoResult<Option<Profile>>;
    /// Exact match after handle sanitization.
    fn get_profiles_by_handle(&self, handle: &str) -> RepoResult<Vec<Profile>>;
    /// Exact match after trim/lowercase.
    fn get_profile_by_activation_token(&self, token: &str) -> RepoResult<Option<Profile>>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    /// Wraps a connection that has been opened through `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "profile", PROFILE_COLUMNS)?;
        Ok(Self { conn })
    }

    fn query_profiles<P: Params>(&self, filter: &str, params: P) -> RepoResult<Vec<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE {filter};"))?;
        let mut rows = stmt.query(params)?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            profiles.push(parse_profile_row(row)?);
        }
        Ok(profiles)
    }

    fn query_one<P: Params>(&self, filter: &str, params: P) -> RepoResult<Option<Profile>> {
        Ok(self.query_profiles(filter, params)?.into_iter().next())
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn insert_profile(&self, profile: &Profile) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .conn
            .execute(
                "INSERT INTO profile (
                    id,
                    activation_token,
                    handle,
                    email,
                    credential_hash,
                    credential_salt
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    profile.id().as_bytes().as_slice(),
                    profile.activation_token(),
                    profile.handle(),
                    profile.email(),
                    profile.credential_hash(),
                    profile.credential_salt(),
                ],
            )
            .map(|_| ())
            .map_err(RepoError::from);
        log_outcome("profile_insert", &profile.id(), started_at, &result);
        result
    }

    fn update_profile(&self, profile: &Profile) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .conn
            .execute(
                "UPDATE profile
                 SET
                    activation_token = ?2,
                    handle = ?3,
                    email = ?4,
                    credential_hash = ?5,
                    credential_salt = ?6
                 WHERE id = ?1;",
                params![
                    profile.id().as_bytes().as_slice(),
                    profile.activation_token(),
                    profile.handle(),
                    profile.email(),
                    profile.credential_hash(),
                    profile.credential_salt(),
                ],
            )
            .map_err(RepoError::from);
        log_outcome("profile_update", &profile.id(), started_at, &result);

        if result? == 0 {
            warn!(
                "event=profile_update module=repo status=noop subject={} rows=0",
                profile.id()
            );
        }
        Ok(())
    }

    fn delete_profile(&self, id: ProfileId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .conn
            .execute(
                "DELETE FROM profile WHERE id = ?1;",
                [id.as_bytes().as_slice()],
            )
            .map_err(RepoError::from);
        log_outcome("profile_delete", &id, started_at, &result);

        if result? == 0 {
            warn!(
                "event=profile_delete module=repo status=noop subject={} rows=0",
                id
            );
        }
        Ok(())
    }

    fn get_profile_by_id(&self, id: ProfileId) -> RepoResult<Option<Profile>> {
        self.query_one("id = ?1", [id.as_bytes().as_slice()])
    }

    fn get_profile_by_email(&self, email: &str) -> RepoResult<Option<Profile>> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }
        self.query_one("email = ?1", [email])
    }

    fn get_profiles_by_handle(&self, handle: &str) -> RepoResult<Vec<Profile>> {
        let handle = sanitize_text(handle);
        if handle.is_empty() {
            return Ok(Vec::new());
        }
        self.query_profiles("handle = ?1", [handle])
    }

    fn get_profile_by_activation_token(&self, token: &str) -> RepoResult<Option<Profile>> {
        let token = token.trim().to_ascii_lowercase();
        if token.is_empty() {
            return Ok(None);
        }
        self.query_one("activation_token = ?1", [token])
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let id = uuid_column(row, "profile", "id")?;
    let activation_token: Option<String> = row.get("activation_token")?;
    let handle: String = row.get("handle")?;
    let email: String = row.get("email")?;
    let credential_hash: String = row.get("credential_hash")?;
    let credential_salt: String = row.get("credential_salt")?;

    Profile::with_id(
        id,
        activation_token.as_deref(),
        &handle,
        &email,
        &credential_hash,
        &credential_salt,
    )
    .map_err(|err| RepoError::InvalidData(format!("profile row {id}: {err}")))
}
