//! Conditions: single comparison or existence checks against game state.
//!
//! Two forms exist:
//!
//! - [`Condition`]: attribute-compare form stored in the graph and embedded in
//!   trigger trees. Compares attribute `attributeId` on entity `targetUuid`.
//! - [`EffectCondition`]: typed form used inside behaviors. Resolves its
//!   subject through a role (`SELF`, `OWNER`, `TARGET`, or their stats bundle).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Id;
use crate::error::{Issue, RecordKind};

use super::check::{describe, FieldPath, Fields};
use super::Schema;

/// Comparison operator. Defaults to `eq`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "lt")]
    Lt,
    #[serde(rename = "gt")]
    Gt,
    #[serde(rename = "lte")]
    Lte,
    #[serde(rename = "gte")]
    Gte,
    #[default]
    #[serde(rename = "eq")]
    Eq,
    #[serde(rename = "neq")]
    Neq,
    /// `current / max < value`
    #[serde(rename = "lt_percent")]
    LtPercent,
    /// `current / max > value`
    #[serde(rename = "gt_percent")]
    GtPercent,
    #[serde(rename = "HAS")]
    Has,
    #[serde(rename = "NOT_HAS")]
    NotHas,
}

impl CompareOp {
    pub const NAMES: &'static [&'static str] = &[
        "lt", "gt", "lte", "gte", "eq", "neq", "lt_percent", "gt_percent", "HAS", "NOT_HAS",
    ];

    /// Wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CompareOp::Lt => "lt",
            CompareOp::Gt => "gt",
            CompareOp::Lte => "lte",
            CompareOp::Gte => "gte",
            CompareOp::Eq => "eq",
            CompareOp::Neq => "neq",
            CompareOp::LtPercent => "lt_percent",
            CompareOp::GtPercent => "gt_percent",
            CompareOp::Has => "HAS",
            CompareOp::NotHas => "NOT_HAS",
        }
    }

    /// `lt_percent` / `gt_percent`.
    #[must_use]
    pub const fn is_percent(self) -> bool {
        matches!(self, CompareOp::LtPercent | CompareOp::GtPercent)
    }

    /// `HAS` / `NOT_HAS`.
    #[must_use]
    pub const fn is_presence(self) -> bool {
        matches!(self, CompareOp::Has | CompareOp::NotHas)
    }

    /// `lt`, `gt`, `lte`, `gte`.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, CompareOp::Lt | CompareOp::Gt | CompareOp::Lte | CompareOp::Gte)
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Attribute-compare condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Holder of this condition (skill, status, behavior).
    pub owner_uuid: Id,
    /// Entity the check runs against.
    pub target_uuid: Id,

    /// Attribute to inspect on the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_id: Option<String>,

    #[serde(default)]
    pub op: CompareOp,

    /// Comparison target. For `HAS`/`NOT_HAS` without `attributeId`, a tag or
    /// status id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Condition {
    /// Create a condition on `attribute` of `target`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<Id>,
        target: impl Into<Id>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            owner_uuid: owner.into(),
            target_uuid: target.into(),
            attribute_id: None,
            op: CompareOp::default(),
            value: None,
            comment: None,
        }
    }

    #[must_use]
    pub fn on_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute_id = Some(attribute.into());
        self
    }

    /// Set operator and comparison value.
    #[must_use]
    pub fn compare(mut self, op: CompareOp, value: impl Into<Value>) -> Self {
        self.op = op;
        self.value = Some(value.into());
        self
    }

    /// Set a presence operator (`HAS` / `NOT_HAS`) with no value.
    #[must_use]
    pub fn presence(mut self, op: CompareOp) -> Self {
        self.op = op;
        self
    }
}

impl Schema for Condition {
    const KIND: RecordKind = RecordKind::Condition;

    fn shape(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>) {
        let mut fields = Fields::of(value, at, issues);
        if !fields.is_object() {
            return;
        }
        fields
            .string("id")
            .string("name")
            .opt_string("description")
            .id("ownerUuid")
            .id("targetUuid")
            .opt_string("attributeId")
            .opt_string("comment");
        fields.opt_one_of("op", CompareOp::NAMES);
    }

    /// Drafts may leave `attributeId` and `value` unset; a missing operand
    /// surfaces when the condition is evaluated. A value that is present must
    /// still fit the operator.
    fn check(&self, at: &FieldPath, issues: &mut Vec<Issue>) {
        let Some(value) = self.value.as_ref() else {
            return;
        };
        if self.op.is_presence() {
            if self.attribute_id.is_none() && !value.is_string() {
                at.field("value").issue(
                    issues,
                    format!("{} expects a tag or status id, got {}", self.op, describe(value)),
                );
            }
            return;
        }
        check_operand(self.op, Some(value), &at.field("value"), issues);
    }
}

/// Kind of typed check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    StatCompare,
    VariableCompare,
    StatusCheck,
    Chance,
    TagCheck,
}

impl ConditionType {
    pub const NAMES: &'static [&'static str] =
        &["STAT_COMPARE", "VARIABLE_COMPARE", "STATUS_CHECK", "CHANCE", "TAG_CHECK"];
}

/// Where a typed condition or regulator reads its subject from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    /// The entity holding the condition.
    #[default]
    #[serde(rename = "SELF")]
    SelfEntity,
    /// The holder's owner (e.g. the character casting a skill).
    Owner,
    /// The entity being acted upon.
    Target,
    #[serde(rename = "SELF_STATS")]
    SelfStats,
    OwnerStats,
    TargetStats,
}

impl Source {
    pub const NAMES: &'static [&'static str] =
        &["SELF", "OWNER", "TARGET", "SELF_STATS", "OWNER_STATS", "TARGET_STATS"];

    /// Read from the role's stats bundle rather than the entity itself.
    #[must_use]
    pub const fn is_stats(self) -> bool {
        matches!(self, Source::SelfStats | Source::OwnerStats | Source::TargetStats)
    }

    /// Default source for effect regulators.
    #[must_use]
    pub const fn self_stats() -> Self {
        Source::SelfStats
    }
}

/// Typed condition used by behaviors and effects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: ConditionType,
    #[serde(default)]
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<String>,
    #[serde(default)]
    pub op: CompareOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Compare against this variable instead of `value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl EffectCondition {
    fn new(kind: ConditionType) -> Self {
        Self {
            id: None,
            kind,
            source: Source::default(),
            stat: None,
            variable: None,
            status_id: None,
            tag_id: None,
            op: CompareOp::default(),
            value: None,
            ref_variable: None,
            comment: None,
        }
    }

    /// `STAT_COMPARE` on `stat`.
    pub fn stat(source: Source, stat: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            source,
            stat: Some(stat.into()),
            op,
            value: Some(value.into()),
            ..Self::new(ConditionType::StatCompare)
        }
    }

    /// `VARIABLE_COMPARE` on `variable`.
    pub fn variable(source: Source, variable: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            source,
            variable: Some(variable.into()),
            op,
            value: Some(value.into()),
            ..Self::new(ConditionType::VariableCompare)
        }
    }

    /// `STATUS_CHECK` for `status`.
    pub fn status(source: Source, status: impl Into<String>, op: CompareOp) -> Self {
        Self {
            source,
            status_id: Some(status.into()),
            op,
            ..Self::new(ConditionType::StatusCheck)
        }
    }

    /// `TAG_CHECK` for `tag`.
    pub fn tag(source: Source, tag: impl Into<String>, op: CompareOp) -> Self {
        Self {
            source,
            tag_id: Some(tag.into()),
            op,
            ..Self::new(ConditionType::TagCheck)
        }
    }

    /// `CHANCE` with probability `p`.
    pub fn chance(p: f64) -> Self {
        Self {
            value: Some(Value::from(p)),
            ..Self::new(ConditionType::Chance)
        }
    }

    /// Compare against another variable instead of a literal.
    #[must_use]
    pub fn against_variable(mut self, variable: impl Into<String>) -> Self {
        self.value = None;
        self.ref_variable = Some(variable.into());
        self
    }
}

impl Schema for EffectCondition {
    const KIND: RecordKind = RecordKind::EffectCondition;

    fn shape(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>) {
        let mut fields = Fields::of(value, at, issues);
        if !fields.is_object() {
            return;
        }
        fields.one_of("type", ConditionType::NAMES);
        fields.opt_one_of("source", Source::NAMES);
        fields.opt_one_of("op", CompareOp::NAMES);
        fields
            .opt_string("id")
            .opt_string("stat")
            .opt_string("variable")
            .opt_string("statusId")
            .opt_string("tagId")
            .opt_string("refVariable")
            .opt_string("comment");
    }

    fn check(&self, at: &FieldPath, issues: &mut Vec<Issue>) {
        let (field, present) = match self.kind {
            ConditionType::StatCompare => ("stat", self.stat.is_some()),
            ConditionType::VariableCompare => ("variable", self.variable.is_some()),
            ConditionType::StatusCheck => ("statusId", self.status_id.is_some()),
            ConditionType::TagCheck => ("tagId", self.tag_id.is_some()),
            ConditionType::Chance => {
                let ok = self
                    .value
                    .as_ref()
                    .and_then(Value::as_f64)
                    .is_some_and(|p| (0.0..=1.0).contains(&p));
                if !ok {
                    at.field("value").issue(issues, "CHANCE needs a probability in [0, 1]");
                }
                return;
            }
        };
        if !present {
            at.field(field).issue(issues, "required for this condition type");
        }

        match self.kind {
            ConditionType::StatusCheck | ConditionType::TagCheck => {
                if !matches!(self.op, CompareOp::Has | CompareOp::NotHas | CompareOp::Eq | CompareOp::Neq) {
                    at.field("op")
                        .issue(issues, format!("{} is not an existence check", self.op));
                }
                if let Some(v) = self.value.as_ref().filter(|v| !v.is_boolean()) {
                    at.field("value")
                        .issue(issues, format!("expected boolean, got {}", describe(v)));
                }
            }
            _ if self.ref_variable.is_some() => {
                if self.op.is_percent() {
                    at.field("refVariable")
                        .issue(issues, "percent operators compare against a literal fraction");
                }
            }
            _ => check_operand(self.op, self.value.as_ref(), &at.field("value"), issues),
        }
    }
}

/// Shared operand rules for comparison operators.
fn check_operand(op: CompareOp, value: Option<&Value>, at: &FieldPath, issues: &mut Vec<Issue>) {
    if op.is_presence() {
        return;
    }
    let Some(value) = value else {
        at.issue(issues, format!("required for operator {}", op));
        return;
    };
    if op.is_percent() {
        if !value.as_f64().is_some_and(|f| (0.0..=1.0).contains(&f)) {
            at.issue(
                issues,
                format!("{} needs a fraction in [0, 1], got {}", op, describe(value)),
            );
        }
    } else if value.is_array() || value.is_object() {
        at.issue(
            issues,
            format!("expected number, boolean or string, got {}", describe(value)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_op_defaults_to_eq() {
        let c = Condition::parse(&json!({
            "id": "c1",
            "name": "Is dead",
            "ownerUuid": "skill-1",
            "targetUuid": "char-001",
            "attributeId": "is_dead",
            "value": true
        }))
        .unwrap();
        assert_eq!(c.op, CompareOp::Eq);
    }

    #[test]
    fn test_op_wire_names() {
        let ops: Vec<CompareOp> =
            serde_json::from_value(json!(["lt_percent", "HAS", "NOT_HAS", "gte"])).unwrap();
        assert_eq!(
            ops,
            vec![CompareOp::LtPercent, CompareOp::Has, CompareOp::NotHas, CompareOp::Gte]
        );
        assert!(serde_json::from_value::<CompareOp>(json!("has")).is_err());
    }

    #[test]
    fn test_percent_needs_fraction() {
        let base = Condition::new("c", "Low HP", "skill-1", "char-001").on_attribute("hp");

        assert!(base.clone().compare(CompareOp::LtPercent, 0.3).validate().is_ok());

        let err = base.clone().compare(CompareOp::LtPercent, 30).validate().unwrap_err();
        assert!(err.issue_at("value").unwrap().message.contains("fraction"));
    }

    #[test]
    fn test_presence_value_names_tag() {
        let c = Condition::new("c", "Has", "s", "t").compare(CompareOp::Has, "burning");
        assert!(c.validate().is_ok());

        let c = Condition::new("c", "Has", "s", "t").compare(CompareOp::Has, 3);
        assert!(c.validate().unwrap_err().issue_at("value").is_some());

        let c = Condition::new("c", "Has", "s", "t")
            .on_attribute("shield")
            .presence(CompareOp::NotHas);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_draft_condition_is_accepted() {
        let draft = Condition::parse(&json!({
            "id": "c1",
            "name": "Draft",
            "ownerUuid": "skill-1",
            "targetUuid": "char-001"
        }))
        .unwrap();
        assert_eq!(draft.op, CompareOp::Eq);
        assert!(draft.attribute_id.is_none() && draft.value.is_none());

        let attribute_only = Condition::new("c", "Cmp", "s", "t").on_attribute("hp");
        assert!(attribute_only.validate().is_ok());
        assert!(Condition::new("c", "Cmp", "s", "t").presence(CompareOp::Gt).validate().is_ok());
    }

    #[test]
    fn test_operand_must_be_scalar() {
        let c = Condition::new("c", "Cmp", "s", "t").compare(CompareOp::Eq, json!([1, 2]));
        assert!(c.validate().unwrap_err().issue_at("value").is_some());
    }

    #[test]
    fn test_effect_condition_defaults() {
        let c = EffectCondition::parse(&json!({ "type": "STATUS_CHECK", "statusId": "burn" })).unwrap();
        assert_eq!(c.source, Source::SelfEntity);
        assert_eq!(c.op, CompareOp::Eq);
    }

    #[test]
    fn test_effect_condition_requires_subject_field() {
        let err = EffectCondition::parse(&json!({ "type": "STAT_COMPARE", "op": "gt", "value": 3 }))
            .unwrap_err();
        assert!(err.issue_at("stat").is_some());

        let err = EffectCondition::parse(&json!({ "type": "TAG_CHECK", "tagId": "undead", "op": "lt" }))
            .unwrap_err();
        assert!(err.issue_at("op").is_some());
    }

    #[test]
    fn test_chance_probability() {
        assert!(EffectCondition::chance(0.25).validate().is_ok());
        assert!(EffectCondition::chance(1.5).validate().is_err());
    }

    #[test]
    fn test_ref_variable_replaces_value() {
        let c = EffectCondition::variable(Source::SelfEntity, "combo", CompareOp::Gte, 0)
            .against_variable("comboTarget");
        assert!(c.validate().is_ok());
        assert!(c.value.is_none());
    }

    #[test]
    fn test_source_names() {
        let sources: Vec<Source> =
            serde_json::from_value(json!(["SELF", "OWNER_STATS", "TARGET"])).unwrap();
        assert_eq!(sources, vec![Source::SelfEntity, Source::OwnerStats, Source::Target]);
        assert!(Source::OwnerStats.is_stats());
    }
}
