//! Clap (like) join entity.
//!
//! # Responsibility
//! - Link one profile to one story at a point in time.
//!
//! # Invariants
//! - Claps are immutable after construction; there are no setters.
//! - Repeated claps for the same profile/story pair are allowed.

use crate::model::profile::ProfileId;
use crate::model::story::StoryId;
use crate::model::validate::{validate_uuid, TimestampInput, UuidInput, ValidationResult};
use crate::model::{from_epoch_millis, resolve_timestamp, to_epoch_millis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable clap identifier.
pub type ClapId = Uuid;

/// Validated clap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "ClapWire")]
pub struct Clap {
    id: ClapId,
    story_id: StoryId,
    profile_id: ProfileId,
    clapped_at: DateTime<Utc>,
}

/// JSON projection of a clap. The clap's own id is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClapWire {
    pub clap_story_id: StoryId,
    pub clap_profile_id: ProfileId,
    /// Epoch milliseconds.
    pub clap_date_time: i64,
}

impl Clap {
    /// Creates a clap with a generated id, stamped now.
    pub fn new(story_id: StoryId, profile_id: ProfileId) -> ValidationResult<Self> {
        Self::with_id(Uuid::new_v4(), story_id, profile_id, None)
    }

    /// Creates a clap with caller-provided identity.
    pub fn with_id<'a, 'b, 'c>(
        id: impl Into<UuidInput<'a>>,
        story_id: impl Into<UuidInput<'b>>,
        profile_id: impl Into<UuidInput<'c>>,
        clapped_at: Option<TimestampInput<'_>>,
    ) -> ValidationResult<Self> {
        let id = validate_uuid(id).map_err(|err| err.in_field("clap_id"))?;
        let story_id = validate_uuid(story_id).map_err(|err| err.in_field("clap_story_id"))?;
        let profile_id =
            validate_uuid(profile_id).map_err(|err| err.in_field("clap_profile_id"))?;
        let clapped_at = resolve_timestamp(clapped_at, "clap_date_time")?;

        Ok(Self {
            id,
            story_id,
            profile_id,
            clapped_at,
        })
    }

    /// Rebuilds a clap from its wire form; the id travels separately.
    pub fn from_wire(id: ClapId, wire: &ClapWire) -> ValidationResult<Self> {
        let clapped_at = from_epoch_millis(wire.clap_date_time, "clap_date_time")?;
        Self::with_id(
            id,
            wire.clap_story_id,
            wire.clap_profile_id,
            Some(TimestampInput::At(clapped_at)),
        )
    }

    pub fn id(&self) -> ClapId {
        self.id
    }

    pub fn story_id(&self) -> StoryId {
        self.story_id
    }

    pub fn profile_id(&self) -> ProfileId {
        self.profile_id
    }

    pub fn clapped_at(&self) -> DateTime<Utc> {
        self.clapped_at
    }

    pub fn to_wire(&self) -> ClapWire {
        ClapWire {
            clap_story_id: self.story_id,
            clap_profile_id: self.profile_id,
            clap_date_time: to_epoch_millis(&self.clapped_at),
        }
    }
}

impl From<Clap> for ClapWire {
    fn from(value: Clap) -> Self {
        value.to_wire()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const STORY: &str = "0b6c7d8e-9f0a-4b1c-8d2e-3f4a5b6c7d8e";

    #[test]
    fn new_clap_is_stamped_now() {
        let before = Utc::now() - chrono::Duration::seconds(1);
        let clap = Clap::new(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert!(clap.clapped_at() >= before);
        assert!(clap.clapped_at() <= Utc::now());
    }

    #[test]
    fn ids_are_tagged_with_their_wire_field() {
        let err = Clap::with_id(Uuid::new_v4(), STORY, "nope", None).unwrap_err();
        assert_eq!(err.field(), "clap_profile_id");
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);

        let err = Clap::with_id("nope", STORY, STORY, None).unwrap_err();
        assert_eq!(err.field(), "clap_id");
    }

    #[test]
    fn wire_form_drops_the_clap_id() {
        let clap = Clap::with_id(
            Uuid::new_v4(),
            STORY,
            Uuid::new_v4(),
            Some("2024-05-06 07:08:09.0105".into()),
        )
        .unwrap();
        let wire = clap.to_wire();
        assert_eq!(wire.clap_story_id.to_string(), STORY);
        assert_eq!(wire.clap_date_time, 1_714_979_289_011);

        let rebuilt = Clap::from_wire(clap.id(), &wire).unwrap();
        assert_eq!(rebuilt.id(), clap.id());
        assert_eq!(rebuilt.profile_id(), clap.profile_id());
    }
}
