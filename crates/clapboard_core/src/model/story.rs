//! Story entity.
//!
//! # Responsibility
//! - Hold one validated piece of published content and its author link.
//! - Convert to and from the `story*` wire shape.
//!
//! # Invariants
//! - `content` is sanitized, non-empty and at most 60,000 characters.
//! - `published_at` has microsecond precision.
//! - `author_id` existence is checked by the store's foreign key, not here.

use crate::model::profile::ProfileId;
use crate::model::validate::{
    bounded_text, validate_uuid, TimestampInput, UuidInput, ValidationError, ValidationResult,
};
use crate::model::{from_epoch_millis, resolve_timestamp, to_epoch_millis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable story identifier.
pub type StoryId = Uuid;

pub const CONTENT_MAX_CHARS: usize = 60_000;

/// Validated story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoryWire", into = "StoryWire")]
pub struct Story {
    id: StoryId,
    author_id: ProfileId,
    content: String,
    published_at: DateTime<Utc>,
}

/// JSON projection of a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryWire {
    pub story_id: StoryId,
    pub story_profile_id: ProfileId,
    pub story_content: String,
    /// Epoch milliseconds.
    pub story_date_time: i64,
}

impl Story {
    /// Creates a story with a generated id, published now.
    pub fn new(author_id: ProfileId, content: &str) -> ValidationResult<Self> {
        Self::with_id(Uuid::new_v4(), author_id, content, None)
    }

    /// Creates a story with caller-provided identity.
    ///
    /// Validates id, author id, content and timestamp in that order. A `None`
    /// timestamp means "now".
    pub fn with_id<'a, 'b>(
        id: impl Into<UuidInput<'a>>,
        author_id: impl Into<UuidInput<'b>>,
        content: &str,
        published_at: Option<TimestampInput<'_>>,
    ) -> ValidationResult<Self> {
        let id = validate_uuid(id).map_err(|err| err.in_field("story_id"))?;
        let author_id =
            validate_uuid(author_id).map_err(|err| err.in_field("story_profile_id"))?;
        let content = validate_content(content)?;
        let published_at = resolve_timestamp(published_at, "story_date_time")?;

        Ok(Self {
            id,
            author_id,
            content,
            published_at,
        })
    }

    /// Rebuilds a story from its wire form.
    pub fn from_wire(wire: &StoryWire) -> ValidationResult<Self> {
        let published_at = from_epoch_millis(wire.story_date_time, "story_date_time")?;
        Self::with_id(
            wire.story_id,
            wire.story_profile_id,
            &wire.story_content,
            Some(TimestampInput::At(published_at)),
        )
    }

    pub fn id(&self) -> StoryId {
        self.id
    }

    pub fn author_id(&self) -> ProfileId {
        self.author_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn set_content(&mut self, content: &str) -> ValidationResult<()> {
        self.content = validate_content(content)?;
        Ok(())
    }

    /// Sets the publication time; `None` stamps the current time.
    pub fn set_published_at(
        &mut self,
        published_at: Option<TimestampInput<'_>>,
    ) -> ValidationResult<()> {
        self.published_at = resolve_timestamp(published_at, "story_date_time")?;
        Ok(())
    }

    pub fn to_wire(&self) -> StoryWire {
        StoryWire {
            story_id: self.id,
            story_profile_id: self.author_id,
            story_content: self.content.clone(),
            story_date_time: to_epoch_millis(&self.published_at),
        }
    }
}

impl From<Story> for StoryWire {
    fn from(value: Story) -> Self {
        value.to_wire()
    }
}

impl TryFrom<StoryWire> for Story {
    type Error = ValidationError;

    fn try_from(value: StoryWire) -> Result<Self, Self::Error> {
        Self::from_wire(&value)
    }
}

/// Sanitizes story content and bounds its length.
pub fn validate_content(content: &str) -> ValidationResult<String> {
    bounded_text(content, "story_content", CONTENT_MAX_CHARS)
}
