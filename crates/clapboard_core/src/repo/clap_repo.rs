//! Clap repository contract and SQLite implementation.
//!
//! Claps are append/delete only; there is no update path.

use crate::model::clap::{Clap, ClapId};
use crate::model::profile::ProfileId;
use crate::model::story::StoryId;
use crate::model::validate::TimestampInput;
use crate::repo::{
    ensure_connection_ready, log_outcome, timestamp_column, timestamp_to_db, uuid_column,
    RepoError, RepoResult,
};
use log::warn;
use rusqlite::{params, Connection, Params, Row};
use std::time::Instant;

const CLAP_COLUMNS: &[&str] = &["id", "story_id", "profile_id", "clapped_at"];

const CLAP_SELECT_SQL: &str = "SELECT
    id,
    story_id,
    profile_id,
    clapped_at
FROM clap";

/// Repository interface for clap persistence.
pub trait ClapRepository {
    fn insert_clap(&self, clap: &Clap) -> RepoResult<()>;
    fn delete_clap(&self, id: ClapId) -> RepoResult<()>;
    fn get_clap_by_id(&self, id: ClapId) -> RepoResult<Option<Clap>>;
    fn get_claps_by_story_id(&self, story_id: StoryId) -> RepoResult<Vec<Clap>>;
    fn get_claps_by_profile_id(&self, profile_id: ProfileId) -> RepoResult<Vec<Clap>>;
    fn get_all_claps(&self) -> RepoResult<Vec<Clap>>;
}

/// SQLite-backed clap repository.
pub struct SqliteClapRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClapRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "clap", CLAP_COLUMNS)?;
        Ok(Self { conn })
    }

    fn query_claps<P: Params>(&self, filter: Option<&str>, params: P) -> RepoResult<Vec<Clap>> {
        let sql = match filter {
            Some(filter) => format!("{CLAP_SELECT_SQL} WHERE {filter};"),
            None => format!("{CLAP_SELECT_SQL};"),
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params)?;
        let mut claps = Vec::new();
        while let Some(row) = rows.next()? {
            claps.push(parse_clap_row(row)?);
        }
        Ok(claps)
    }
}

impl ClapRepository for SqliteClapRepository<'_> {
    fn insert_clap(&self, clap: &Clap) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .conn
            .execute(
                "INSERT INTO clap (id, story_id, profile_id, clapped_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    clap.id().as_bytes().as_slice(),
                    clap.story_id().as_bytes().as_slice(),
                    clap.profile_id().as_bytes().as_slice(),
                    timestamp_to_db(&clap.clapped_at()),
                ],
            )
            .map(|_| ())
            .map_err(RepoError::from);
        log_outcome("clap_insert", &clap.id(), started_at, &result);
        result
    }

    fn delete_clap(&self, id: ClapId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .conn
            .execute(
                "DELETE FROM clap WHERE id = ?1;",
                [id.as_bytes().as_slice()],
            )
            .map_err(RepoError::from);
        log_outcome("clap_delete", &id, started_at, &result);

        if result? == 0 {
            warn!(
                "event=clap_delete module=repo status=noop subject={} rows=0",
                id
            );
        }
        Ok(())
    }

    fn get_clap_by_id(&self, id: ClapId) -> RepoResult<Option<Clap>> {
        let claps = self.query_claps(Some("id = ?1"), [id.as_bytes().as_slice()])?;
        Ok(claps.into_iter().next())
    }

    fn get_claps_by_story_id(&self, story_id: StoryId) -> RepoResult<Vec<Clap>> {
        self.query_claps(Some("story_id = ?1"), [story_id.as_bytes().as_slice()])
    }

    fn get_claps_by_profile_id(&self, profile_id: ProfileId) -> RepoResult<Vec<Clap>> {
        self.query_claps(Some("profile_id = ?1"), [profile_id.as_bytes().as_slice()])
    }

    fn get_all_claps(&self) -> RepoResult<Vec<Clap>> {
        self.query_claps(None, [])
    }
}

fn parse_clap_row(row: &Row<'_>) -> RepoResult<Clap> {
    let id = uuid_column(row, "clap", "id")?;
    let story_id = uuid_column(row, "clap", "story_id")?;
    let profile_id = uuid_column(row, "clap", "profile_id")?;
    let clapped_at = timestamp_column(row, "clap", "clapped_at")?;

    Clap::with_id(
        id,
        story_id,
        profile_id,
        Some(TimestampInput::At(clapped_at)),
    )
    .map_err(|err| RepoError::InvalidData(format!("clap row {id}: {err}")))
}
