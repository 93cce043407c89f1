//! Regulators: dynamic numeric adjustments computed from a source value.
//!
//! [`Regulator`] is the stored record form, reading `sourceAttributeId` on
//! `sourceUuid`. [`EffectRegulator`] is the form nested inside behavior
//! effects, reading a stat or variable through a [`Source`] role. Both reduce
//! to the same [`Scaling`] parameters for the calculator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Id;
use crate::error::{Issue, RecordKind};

use super::check::{FieldPath, Fields};
use super::condition::Source;
use super::Schema;

/// Scaling function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegulatorType {
    /// `scaled * factor`
    #[default]
    LinearScaling,
    /// `bonusValue` when `scaled` passes the threshold comparison, else `0`.
    ThresholdBonus,
    /// Linear scaling over a named variable.
    VariableScaling,
}

impl RegulatorType {
    pub const NAMES: &'static [&'static str] =
        &["LINEAR_SCALING", "THRESHOLD_BONUS", "VARIABLE_SCALING"];
}

/// How the raw source value is normalised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulatorMode {
    /// `v / vmax`
    Percent,
    /// `1 - v / vmax`
    InversePercent,
    /// `v`
    #[default]
    Value,
}

impl RegulatorMode {
    pub const NAMES: &'static [&'static str] = &["percent", "inverse_percent", "value"];

    /// Whether this mode divides by a maximum.
    #[must_use]
    pub const fn needs_max(self) -> bool {
        !matches!(self, RegulatorMode::Value)
    }
}

/// Combination with the base value, or the threshold comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegulatorOp {
    #[default]
    Add,
    Mul,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl RegulatorOp {
    pub const NAMES: &'static [&'static str] = &["add", "mul", "gt", "lt", "gte", "lte"];

    /// Whether this op is a threshold comparison rather than a combination.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(self, RegulatorOp::Gt | RegulatorOp::Lt | RegulatorOp::Gte | RegulatorOp::Lte)
    }

    /// Test `value` against `threshold`. Combination ops compare with `gt`.
    #[must_use]
    pub fn passes(self, value: f64, threshold: f64) -> bool {
        match self {
            RegulatorOp::Lt => value < threshold,
            RegulatorOp::Gte => value >= threshold,
            RegulatorOp::Lte => value <= threshold,
            RegulatorOp::Gt | RegulatorOp::Add | RegulatorOp::Mul => value > threshold,
        }
    }
}

impl std::fmt::Display for RegulatorOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RegulatorOp::Add => "add",
            RegulatorOp::Mul => "mul",
            RegulatorOp::Gt => "gt",
            RegulatorOp::Lt => "lt",
            RegulatorOp::Gte => "gte",
            RegulatorOp::Lte => "lte",
        };
        f.write_str(name)
    }
}

/// Parameters of a scaling function, independent of where the source lives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scaling {
    pub kind: RegulatorType,
    pub mode: RegulatorMode,
    pub op: RegulatorOp,
    pub factor: f64,
    pub threshold: Option<f64>,
    pub bonus_value: Option<f64>,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            kind: RegulatorType::default(),
            mode: RegulatorMode::default(),
            op: RegulatorOp::default(),
            factor: 1.0,
            threshold: None,
            bonus_value: None,
        }
    }
}

fn default_factor() -> f64 {
    1.0
}

/// Stored regulator record.
///
/// For `VARIABLE_SCALING`, `sourceAttributeId` names the variable on
/// `sourceUuid` instead of an attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Regulator {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner_uuid: Id,
    #[serde(rename = "type", default)]
    pub kind: RegulatorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_uuid: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_attribute_id: Option<String>,
    /// Explicit maximum; defaults to the `max` counterpart of the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_source_attribute_id: Option<String>,
    #[serde(default)]
    pub mode: RegulatorMode,
    #[serde(default)]
    pub op: RegulatorOp,
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Regulator {
    /// Create a linear regulator with factor 1.
    pub fn new(id: impl Into<String>, name: impl Into<String>, owner: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            owner_uuid: owner.into(),
            kind: RegulatorType::default(),
            source_uuid: None,
            source_attribute_id: None,
            max_source_attribute_id: None,
            mode: RegulatorMode::default(),
            op: RegulatorOp::default(),
            factor: 1.0,
            threshold: None,
            bonus_value: None,
            comment: None,
        }
    }

    /// Read `attribute` on `entity`.
    #[must_use]
    pub fn from_source(mut self, entity: impl Into<Id>, attribute: impl Into<String>) -> Self {
        self.source_uuid = Some(entity.into());
        self.source_attribute_id = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn with_max(mut self, attribute: impl Into<String>) -> Self {
        self.max_source_attribute_id = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: RegulatorType) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: RegulatorMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_op(mut self, op: RegulatorOp) -> Self {
        self.op = op;
        self
    }

    #[must_use]
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Make this a `THRESHOLD_BONUS` regulator.
    #[must_use]
    pub fn threshold_bonus(mut self, threshold: f64, bonus: f64) -> Self {
        self.kind = RegulatorType::ThresholdBonus;
        self.threshold = Some(threshold);
        self.bonus_value = Some(bonus);
        self
    }

    #[must_use]
    pub fn scaling(&self) -> Scaling {
        Scaling {
            kind: self.kind,
            mode: self.mode,
            op: self.op,
            factor: self.factor,
            threshold: self.threshold,
            bonus_value: self.bonus_value,
        }
    }
}

impl Schema for Regulator {
    const KIND: RecordKind = RecordKind::Regulator;

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
            .opt_id("sourceUuid")
            .opt_string("sourceAttributeId")
            .opt_string("maxSourceAttributeId")
            .opt_number("factor")
            .opt_number("threshold")
            .opt_number("bonusValue")
            .opt_string("comment");
        fields.opt_one_of("type", RegulatorType::NAMES);
        fields.opt_one_of("mode", RegulatorMode::NAMES);
        fields.opt_one_of("op", RegulatorOp::NAMES);
    }

    fn check(&self, at: &FieldPath, issues: &mut Vec<Issue>) {
        check_scaling(&self.scaling(), at, issues);
    }
}

/// Regulator nested inside a behavior effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectRegulator {
    #[serde(rename = "type")]
    pub kind: RegulatorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default = "Source::self_stats")]
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_value: Option<f64>,
    #[serde(default)]
    pub op: RegulatorOp,
    #[serde(default)]
    pub mode: RegulatorMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl EffectRegulator {
    /// Linear scaling on `stat` read from `source`.
    pub fn stat(source: Source, stat: impl Into<String>, factor: f64) -> Self {
        Self {
            kind: RegulatorType::LinearScaling,
            stat: Some(stat.into()),
            variable: None,
            source,
            factor: Some(factor),
            threshold: None,
            bonus_value: None,
            op: RegulatorOp::default(),
            mode: RegulatorMode::default(),
            comment: None,
        }
    }

    /// Variable scaling on `variable` read from `source`.
    pub fn variable(source: Source, variable: impl Into<String>, factor: f64) -> Self {
        Self {
            kind: RegulatorType::VariableScaling,
            stat: None,
            variable: Some(variable.into()),
            ..Self::stat(source, String::new(), factor)
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: RegulatorMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_op(mut self, op: RegulatorOp) -> Self {
        self.op = op;
        self
    }

    /// Make this a `THRESHOLD_BONUS` regulator.
    #[must_use]
    pub fn threshold_bonus(mut self, threshold: f64, bonus: f64) -> Self {
        self.kind = RegulatorType::ThresholdBonus;
        self.threshold = Some(threshold);
        self.bonus_value = Some(bonus);
        self
    }

    #[must_use]
    pub fn scaling(&self) -> Scaling {
        Scaling {
            kind: self.kind,
            mode: self.mode,
            op: self.op,
            factor: self.factor.unwrap_or(1.0),
            threshold: self.threshold,
            bonus_value: self.bonus_value,
        }
    }
}

impl Schema for EffectRegulator {
    const KIND: RecordKind = RecordKind::EffectRegulator;

    fn shape(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>) {
        let mut fields = Fields::of(value, at, issues);
        if !fields.is_object() {
            return;
        }
        fields
            .opt_string("stat")
            .opt_string("variable")
            .opt_number("factor")
            .opt_number("threshold")
            .opt_number("bonusValue")
            .opt_string("comment");
        fields.one_of("type", RegulatorType::NAMES);
        fields.opt_one_of("source", Source::NAMES);
        fields.opt_one_of("op", RegulatorOp::NAMES);
        fields.opt_one_of("mode", RegulatorMode::NAMES);
    }

    fn check(&self, at: &FieldPath, issues: &mut Vec<Issue>) {
        match self.kind {
            RegulatorType::VariableScaling if self.variable.is_none() => {
                at.field("variable").issue(issues, "required for VARIABLE_SCALING");
            }
            RegulatorType::LinearScaling | RegulatorType::ThresholdBonus if self.stat.is_none() => {
                at.field("stat").issue(issues, "required for stat-based scaling");
            }
            _ => {}
        }
        check_scaling(&self.scaling(), at, issues);
    }
}

fn check_scaling(scaling: &Scaling, at: &FieldPath, issues: &mut Vec<Issue>) {
    if scaling.kind == RegulatorType::ThresholdBonus {
        if scaling.threshold.is_none() {
            at.field("threshold").issue(issues, "required for THRESHOLD_BONUS");
        }
        if scaling.bonus_value.is_none() {
            at.field("bonusValue").issue(issues, "required for THRESHOLD_BONUS");
        }
    } else if scaling.op.is_comparison() {
        at.field("op").issue(
            issues,
            format!("comparison op {} only applies to THRESHOLD_BONUS", scaling.op),
        );
    }
    if !scaling.factor.is_finite() {
        at.field("factor").issue(issues, "expected a finite number");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_defaults() {
        let reg = Regulator::parse(&json!({
            "id": "reg-1",
            "name": "Rage",
            "ownerUuid": "skill-1",
            "sourceUuid": "char-001",
            "sourceAttributeId": "hp"
        }))
        .unwrap();

        assert_eq!(reg.kind, RegulatorType::LinearScaling);
        assert_eq!(reg.mode, RegulatorMode::Value);
        assert_eq!(reg.op, RegulatorOp::Add);
        assert!((reg.factor - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_threshold_bonus_requires_parameters() {
        let err = Regulator::new("r", "Bonus", "s")
            .with_kind(RegulatorType::ThresholdBonus)
            .validate()
            .unwrap_err();
        assert_eq!(err.paths().collect::<Vec<_>>(), vec!["threshold", "bonusValue"]);

        let ok = Regulator::new("r", "Bonus", "s")
            .threshold_bonus(0.5, 10.0)
            .with_op(RegulatorOp::Gte);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_comparison_op_outside_threshold() {
        let err = Regulator::new("r", "Scale", "s")
            .with_op(RegulatorOp::Lt)
            .validate()
            .unwrap_err();
        assert!(err.issue_at("op").unwrap().message.contains("THRESHOLD_BONUS"));
    }

    #[test]
    fn test_structural_issues() {
        let err = Regulator::parse(&json!({
            "id": "r",
            "name": "R",
            "ownerUuid": "s",
            "mode": "ratio",
            "factor": "two"
        }))
        .unwrap_err();
        assert_eq!(err.paths().collect::<Vec<_>>(), vec!["factor", "mode"]);
    }

    #[test]
    fn test_effect_regulator_defaults_to_self_stats() {
        let reg = EffectRegulator::parse(&json!({ "type": "LINEAR_SCALING", "stat": "atk", "factor": 1.5 }))
            .unwrap();
        assert_eq!(reg.source, Source::SelfStats);
        assert!((reg.scaling().factor - 1.5).abs() < f64::EPSILON);

        let reg = EffectRegulator::parse(&json!({ "type": "LINEAR_SCALING", "stat": "atk" })).unwrap();
        assert!((reg.scaling().factor - 1.0).abs() < f64::EPSILON);

        let err = EffectRegulator::parse(&json!({ "stat": "atk" })).unwrap_err();
        assert_eq!(err.issue_at("type").unwrap().message, "required");
    }

    #[test]
    fn test_effect_regulator_subject() {
        let err = EffectRegulator::parse(&json!({ "type": "VARIABLE_SCALING", "stat": "atk" })).unwrap_err();
        assert!(err.issue_at("variable").is_some());

        let reg = EffectRegulator::variable(Source::SelfEntity, "combo", 2.0);
        assert!(reg.validate().is_ok());
        assert_eq!(reg.stat, None);
    }

    #[test]
    fn test_passes() {
        assert!(RegulatorOp::Gte.passes(0.5, 0.5));
        assert!(!RegulatorOp::Gt.passes(0.5, 0.5));
        assert!(RegulatorOp::Add.passes(0.6, 0.5));
        assert!(RegulatorOp::Lte.passes(0.2, 0.5));
    }
}
