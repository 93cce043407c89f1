//! Behaviors: triggered logic attached to a skill, character or status.
//!
//! `trigger` is a timing tag such as `on_hit` or `turn_start`, not a trigger
//! tree. `conditions` form a flat AND list, and each effect may carry its own
//! gate conditions plus regulators that adjust its `baseValue`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Id;
use crate::error::{Issue, RecordKind};

use super::check::{describe, FieldPath, Fields};
use super::condition::EffectCondition;
use super::regulator::EffectRegulator;
use super::{check_each, shape_each, Schema};

/// The `type` literal of a behavior record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    #[default]
    Behavior,
}

/// One effect, e.g. `damage`, `heal`, `apply_status`, `record_variable`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorEffect {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<String>,
    /// Variable written by `record_variable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// Write mode for `record_variable`, e.g. `add` or `set`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<EffectCondition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulators: Option<Vec<EffectRegulator>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl BehaviorEffect {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_base(mut self, value: impl Into<Value>) -> Self {
        self.base_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_chance(mut self, chance: f64) -> Self {
        self.chance = Some(chance);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status_id = Some(status.into());
        self
    }

    /// Add a gate condition.
    #[must_use]
    pub fn when(mut self, condition: EffectCondition) -> Self {
        self.conditions.get_or_insert_with(Vec::new).push(condition);
        self
    }

    #[must_use]
    pub fn with_regulator(mut self, regulator: EffectRegulator) -> Self {
        self.regulators.get_or_insert_with(Vec::new).push(regulator);
        self
    }

    /// Gate conditions, empty when unset.
    #[must_use]
    pub fn gate(&self) -> &[EffectCondition] {
        self.conditions.as_deref().unwrap_or_default()
    }

    /// Regulators, empty when unset.
    #[must_use]
    pub fn scaling(&self) -> &[EffectRegulator] {
        self.regulators.as_deref().unwrap_or_default()
    }
}

impl Schema for BehaviorEffect {
    const KIND: RecordKind = RecordKind::BehaviorEffect;

    fn shape(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>) {
        let mut fields = Fields::of(value, at, issues);
        if !fields.is_object() {
            return;
        }
        fields
            .string("type")
            .opt_string("element")
            .opt_number("radius")
            .opt_fraction("chance")
            .opt_string("statusId")
            .opt_string("skillId")
            .opt_string("variable")
            .opt_string("valueType")
            .opt_string("op")
            .opt_string("comment");
        if let Some(items) = fields.array("conditions") {
            let path = fields.path("conditions");
            shape_each::<EffectCondition>(items, &path, fields.issues());
        }
        if let Some(items) = fields.array("regulators") {
            let path = fields.path("regulators");
            shape_each::<EffectRegulator>(items, &path, fields.issues());
        }
    }

    fn check(&self, at: &FieldPath, issues: &mut Vec<Issue>) {
        if let Some(chance) = self.chance.filter(|p| !(0.0..=1.0).contains(p)) {
            at.field("chance")
                .issue(issues, format!("expected number in [0, 1], got {}", chance));
        }
        if let Some(v) = self.base_value.as_ref().filter(|v| v.is_array()) {
            at.field("baseValue")
                .issue(issues, format!("expected a single value, got {}", describe(v)));
        }
        check_each(self.gate(), &at.field("conditions"), issues);
        check_each(self.scaling(), &at.field("regulators"), issues);
    }
}

/// Behavior record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Behavior {
    pub uuid: Id,
    #[serde(rename = "type", default)]
    pub kind: BehaviorKind,
    pub owner_uuid: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Timing tag.
    pub trigger: String,
    #[serde(default)]
    pub conditions: Vec<EffectCondition>,
    #[serde(default)]
    pub effects: Vec<BehaviorEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Behavior {
    pub fn new(uuid: impl Into<Id>, owner: impl Into<Id>, trigger: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            kind: BehaviorKind::Behavior,
            owner_uuid: owner.into(),
            name: None,
            trigger: trigger.into(),
            conditions: Vec::new(),
            effects: Vec::new(),
            comment: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn when(mut self, condition: EffectCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: BehaviorEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

impl Schema for Behavior {
    const KIND: RecordKind = RecordKind::Behavior;

    fn shape(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>) {
        let mut fields = Fields::of(value, at, issues);
        if !fields.is_object() {
            return;
        }
        fields
            .id("uuid")
            .opt_literal("type", "behavior")
            .id("ownerUuid")
            .opt_string("name")
            .string("trigger")
            .opt_string("comment");
        if let Some(items) = fields.array("conditions") {
            let path = fields.path("conditions");
            shape_each::<EffectCondition>(items, &path, fields.issues());
        }
        if let Some(items) = fields.array("effects") {
            let path = fields.path("effects");
            shape_each::<BehaviorEffect>(items, &path, fields.issues());
        }
    }

    fn check(&self, at: &FieldPath, issues: &mut Vec<Issue>) {
        check_each(&self.conditions, &at.field("conditions"), issues);
        check_each(&self.effects, &at.field("effects"), issues);
    }
}
