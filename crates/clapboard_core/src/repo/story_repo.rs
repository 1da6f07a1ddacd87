//! Story repository contract and SQLite implementation.
//!
//! # Invariants
//! - `author_id` must reference an existing profile; the foreign key rejects
//!   orphans at insert/update time.
//! - Content search is a case-sensitive literal containment match.

use crate::model::profile::ProfileId;
use crate::model::story::{Story, StoryId};
use crate::model::validate::{sanitize_text, TimestampInput};
use crate::repo::{
    ensure_connection_ready, escape_glob, log_outcome, timestamp_column, timestamp_to_db,
    uuid_column, RepoError, RepoResult,
};
use log::warn;
use rusqlite::{params, Connection, Params, Row};
use std::time::Instant;

const STORY_COLUMNS: &[&str] = &["id", "author_id", "content", "published_at"];

const STORY_SELECT_SQL: &str = "SELECT
    id,
    author_id,
    content,
    published_at
FROM story";

/// Repository interface for story persistence.
pub trait StoryRepository {
    fn insert_story(&self, story: &Story) -> RepoResult<()>;
    fn update_story(&self, story: &Story) -> RepoResult<()>;
    fn delete_story(&self, id: StoryId) -> RepoResult<()>;
    fn get_story_by_id(&self, id: StoryId) -> RepoResult<Option<Story>>;
    fn get_stories_by_author_id(&self, author_id: ProfileId) -> RepoResult<Vec<Story>>;
    /// Stories whose content contains `text` verbatim (case-sensitive).
    fn get_stories_by_content(&self, text: &str) -> RepoResult<Vec<Story>>;
    fn get_all_stories(&self) -> RepoResult<Vec<Story>>;
}

/// SQLite-backed story repository.
pub struct SqliteStoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStoryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "story", STORY_COLUMNS)?;
        Ok(Self { conn })
    }

    fn query_stories<P: Params>(
        &self,
        filter: Option<&str>,
        params: P,
    ) -> RepoResult<Vec<Story>> {
        let sql = match filter {
            Some(filter) => format!("{STORY_SELECT_SQL} WHERE {filter};"),
            None => format!("{STORY_SELECT_SQL};"),
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params)?;
        let mut stories = Vec::new();
        while let Some(row) = rows.next()? {
            stories.push(parse_story_row(row)?);
        }
        Ok(stories)
    }
}

impl StoryRepository for SqliteStoryRepository<'_> {
    fn insert_story(&self, story: &Story) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .conn
            .execute(
                "INSERT INTO story (id, author_id, content, published_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    story.id().as_bytes().as_slice(),
                    story.author_id().as_bytes().as_slice(),
                    story.content(),
                    timestamp_to_db(&story.published_at()),
                ],
            )
            .map(|_| ())
            .map_err(RepoError::from);
        log_outcome("story_insert", &story.id(), started_at, &result);
        result
    }

    fn update_story(&self, story: &Story) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .conn
            .execute(
                "UPDATE story
                 SET
                    author_id = ?2,
                    content = ?3,
                    published_at = ?4
                 WHERE id = ?1;",
                params![
                    story.id().as_bytes().as_slice(),
                    story.author_id().as_bytes().as_slice(),
                    story.content(),
                    timestamp_to_db(&story.published_at()),
                ],
            )
            .map_err(RepoError::from);
        log_outcome("story_update", &story.id(), started_at, &result);

        if result? == 0 {
            warn!(
                "event=story_update module=repo status=noop subject={} rows=0",
                story.id()
            );
        }
        Ok(())
    }

    fn delete_story(&self, id: StoryId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .conn
            .execute(
                "DELETE FROM story WHERE id = ?1;",
                [id.as_bytes().as_slice()],
            )
            .map_err(RepoError::from);
        log_outcome("story_delete", &id, started_at, &result);

        if result? == 0 {
            warn!(
                "event=story_delete module=repo status=noop subject={} rows=0",
                id
            );
        }
        Ok(())
    }

    fn get_story_by_id(&self, id: StoryId) -> RepoResult<Option<Story>> {
        let stories = self.query_stories(Some("id = ?1"), [id.as_bytes().as_slice()])?;
        Ok(stories.into_iter().next())
    }

    fn get_stories_by_author_id(&self, author_id: ProfileId) -> RepoResult<Vec<Story>> {
        self.query_stories(Some("author_id = ?1"), [author_id.as_bytes().as_slice()])
    }

    fn get_stories_by_content(&self, text: &str) -> RepoResult<Vec<Story>> {
        let needle = sanitize_text(text);
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("*{}*", escape_glob(&needle));
        self.query_stories(Some("content GLOB ?1"), [pattern])
    }

    fn get_all_stories(&self) -> RepoResult<Vec<Story>> {
        self.query_stories(None, [])
    }
}

fn parse_story_row(row: &Row<'_>) -> RepoResult<Story> {
    let id = uuid_column(row, "story", "id")?;
    let author_id = uuid_column(row, "story", "author_id")?;
    let content: String = row.get("content")?;
    let published_at = timestamp_column(row, "story", "published_at")?;

    Story::with_id(
        id,
        author_id,
        &content,
        Some(TimestampInput::At(published_at)),
    )
    .map_err(|err| RepoError::InvalidData(format!("story row {id}: {err}")))
}
