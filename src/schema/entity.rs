//! Entity references: one record per game object instance.
//!
//! An entity points at its components (skills, items, statuses, behaviors,
//! stats) by id. `ownerUuid` is a non-owning back-reference to the entity
//! that created or controls it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::core::Id;
use crate::error::{Issue, RecordKind};

use super::check::{FieldPath, Fields};
use super::Schema;

/// What kind of game object an entity is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Character,
    Skill,
    Item,
    Status,
    Behavior,
    StatsBundle,
    Projectile,
}

impl EntityType {
    pub const NAMES: &'static [&'static str] = &[
        "character",
        "skill",
        "item",
        "status",
        "behavior",
        "stats_bundle",
        "projectile",
    ];
}

/// Lifecycle category for skills and statuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Passive,
    Active,
    Buff,
    Debuff,
    Permanent,
}

impl Category {
    pub const NAMES: &'static [&'static str] = &["passive", "active", "buff", "debuff", "permanent"];
}

/// One game object instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    pub uuid: Id,

    #[serde(rename = "type")]
    pub entity_type: EntityType,

    /// Static definition this instance was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Ordered tags. SmallVec keeps the usual handful inline.
    #[serde(default)]
    pub tags: SmallVec<[String; 4]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_uuid: Option<Id>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_uuid: Option<Id>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_uuid: Option<Id>,

    #[serde(default)]
    pub skill_uuids: Vec<Id>,

    #[serde(default)]
    pub item_uuids: Vec<Id>,

    #[serde(default)]
    pub status_uuids: Vec<Id>,

    #[serde(default)]
    pub behavior_uuids: Vec<Id>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl EntityReference {
    /// Create an entity with no components.
    pub fn new(uuid: impl Into<Id>, entity_type: EntityType) -> Self {
        Self {
            uuid: uuid.into(),
            entity_type,
            definition_id: None,
            name: None,
            tags: SmallVec::new(),
            owner_uuid: None,
            stats_uuid: None,
            source_uuid: None,
            skill_uuids: Vec::new(),
            item_uuids: Vec::new(),
            status_uuids: Vec::new(),
            behavior_uuids: Vec::new(),
            category: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_definition(mut self, definition_id: impl Into<String>) -> Self {
        self.definition_id = Some(definition_id.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<Id>) -> Self {
        self.owner_uuid = Some(owner.into());
        self
    }

    #[must_use]
    pub fn with_stats(mut self, stats: impl Into<Id>) -> Self {
        self.stats_uuid = Some(stats.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<Id>) -> Self {
        self.status_uuids.push(status.into());
        self
    }

    #[must_use]
    pub fn with_skill(mut self, skill: impl Into<Id>) -> Self {
        self.skill_uuids.push(skill.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl Schema for EntityReference {
    const KIND: RecordKind = RecordKind::Entity;

    fn shape(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>) {
        let mut fields = Fields::of(value, at, issues);
        if !fields.is_object() {
            return;
        }
        fields.id("uuid");
        fields.one_of("type", EntityType::NAMES);
        fields
            .opt_string("definitionId")
            .opt_string("name")
            .strings("tags")
            .opt_id("ownerUuid")
            .opt_id("statsUuid")
            .opt_id("sourceUuid")
            .ids("skillUuids")
            .ids("itemUuids")
            .ids("statusUuids")
            .ids("behaviorUuids");
        fields.opt_one_of("category", Category::NAMES);
    }
}
