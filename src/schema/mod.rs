//! Record schemas and validation.
//!
//! Every record kind in the battle graph implements [`Schema`]:
//!
//! - `shape` walks raw JSON and reports every structural problem
//!   (missing fields, wrong JSON types, unknown enum tags) by field path.
//! - `check` runs cross-field rules on a typed record, e.g. an attribute's
//!   `value` must match its declared `valueType`.
//!
//! [`Schema::parse`] runs both over editor input; [`Schema::validate`] runs
//! `check` over a record built in Rust. Validation never mutates anything and
//! must pass before a record is admitted into the store.
//!
//! ```
//! use battle_lab::schema::{AttributeComponent, Schema};
//! use serde_json::json;
//!
//! let err = AttributeComponent::parse(&json!({
//!     "id": "hp",
//!     "ownerUuid": "char-001",
//!     "name": "HP",
//!     "valueType": "int",
//!     "value": 12.5
//! }))
//! .unwrap_err();
//!
//! assert!(err.issue_at("value").is_some());
//! ```

mod check;
mod entity;
mod attribute;
mod stats;
mod condition;
mod regulator;
mod behavior;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Issue, RecordKind, ValidationError};

pub use check::{describe, FieldPath, Fields};
pub use entity::{Category, EntityReference, EntityType};
pub use attribute::AttributeComponent;
pub use stats::{StatsBundle, NUMERIC_STATS};
pub use condition::{CompareOp, Condition, ConditionType, EffectCondition, Source};
pub use regulator::{EffectRegulator, Regulator, RegulatorMode, RegulatorOp, RegulatorType, Scaling};
pub use behavior::{Behavior, BehaviorEffect, BehaviorKind};

/// Validation contract shared by every record kind.
pub trait Schema: Sized + DeserializeOwned {
    /// Kind reported in validation errors.
    const KIND: RecordKind;

    /// Report structural problems in raw JSON.
    fn shape(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>);

    /// Report cross-field problems in a typed record.
    fn check(&self, _at: &FieldPath, _issues: &mut Vec<Issue>) {}

    /// Run cross-field rules.
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        self.check(&FieldPath::root(), &mut issues);
        finish(Self::KIND, issues)
    }

    /// Parse and validate raw JSON.
    ///
    /// Structural issues are reported together; cross-field rules run only
    /// once the record deserializes.
    fn parse(value: &Value) -> Result<Self, ValidationError> {
        let mut issues = Vec::new();
        Self::shape(value, &FieldPath::root(), &mut issues);
        finish(Self::KIND, issues)?;

        let record: Self = serde_json::from_value(value.clone()).map_err(|e| ValidationError {
            kind: Self::KIND,
            issues: vec![Issue::new("", e.to_string())],
        })?;
        record.validate()?;
        Ok(record)
    }
}

fn finish(kind: RecordKind, issues: Vec<Issue>) -> Result<(), ValidationError> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { kind, issues })
    }
}

/// Run `check` over a list of nested records.
pub(crate) fn check_each<T: Schema>(items: &[T], at: &FieldPath, issues: &mut Vec<Issue>) {
    for (i, item) in items.iter().enumerate() {
        item.check(&at.index(i), issues);
    }
}

/// Run `shape` over a JSON array of nested records.
pub(crate) fn shape_each<T: Schema>(items: &[Value], at: &FieldPath, issues: &mut Vec<Issue>) {
    for (i, item) in items.iter().enumerate() {
        T::shape(item, &at.index(i), issues);
    }
}
