//! Stats bundles: an entity's numeric state.
//!
//! A bundle groups attribute ids belonging to one owner (`attributeUuids`),
//! and may also inline common stats (`hp`, `maxHp`, `atk`, ...) plus any
//! extra fields. Extra fields are kept verbatim, in their original order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{is_integral, Id, Scalar};
use crate::error::{Issue, RecordKind};

use super::check::{describe, FieldPath, Fields};
use super::Schema;

/// Inline stats that must be numbers when present.
pub const NUMERIC_STATS: &[&str] = &[
    "hp",
    "maxHp",
    "mp",
    "maxMp",
    "atk",
    "def",
    "mag",
    "spd",
    "moveSpeed",
    "exp",
    "cooldown",
    "remainingDuration",
    "tickInterval",
];

const TYPE_TAG: &str = "stats_bundle";

/// A named grouping of an entity's stats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsBundle {
    pub uuid: Id,
    pub owner_uuid: Id,
    #[serde(default)]
    pub attribute_uuids: Vec<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Inline stats and any other fields.
    #[serde(flatten)]
    pub stats: Map<String, Value>,
}

impl StatsBundle {
    /// Create an empty bundle.
    pub fn new(uuid: impl Into<Id>, owner: impl Into<Id>) -> Self {
        Self {
            uuid: uuid.into(),
            owner_uuid: owner.into(),
            attribute_uuids: Vec::new(),
            name: None,
            description: None,
            comment: None,
            stats: Map::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reference an attribute component by id.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<Id>) -> Self {
        self.attribute_uuids.push(attribute.into());
        self
    }

    /// Set an inline stat.
    #[must_use]
    pub fn with_stat(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.stats.insert(key.into(), value.into());
        self
    }

    /// Inline stat value, if present and scalar.
    #[must_use]
    pub fn stat(&self, key: &str) -> Option<Scalar> {
        self.stats.get(key).and_then(Scalar::from_json)
    }

    /// Whether this bundle lists the attribute `id`.
    #[must_use]
    pub fn lists_attribute(&self, id: &str) -> bool {
        self.attribute_uuids.iter().any(|a| a.is(id))
    }
}

impl Schema for StatsBundle {
    const KIND: RecordKind = RecordKind::StatsBundle;

    fn shape(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>) {
        let mut fields = Fields::of(value, at, issues);
        if !fields.is_object() {
            return;
        }
        fields
            .id("uuid")
            .id("ownerUuid")
            .ids("attributeUuids")
            .opt_string("name")
            .opt_string("description")
            .opt_string("comment");
    }

    fn check(&self, at: &FieldPath, issues: &mut Vec<Issue>) {
        for (key, value) in &self.stats {
            if value.is_null() {
                continue;
            }
            let wanted = match key.as_str() {
                "type" if value.as_str() != Some(TYPE_TAG) => Some("\"stats_bundle\""),
                "level" if !is_integral(value) => Some("integer"),
                k if NUMERIC_STATS.contains(&k) && !value.is_number() => Some("number"),
                _ => None,
            };
            if let Some(wanted) = wanted {
                at.field(key)
                    .issue(issues, format!("expected {}, got {}", wanted, describe(value)));
            }
        }
    }
}
