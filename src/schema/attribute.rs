//! Attribute components: one typed value owned by an entity.
//!
//! `valueType` gates the runtime type of `value`. A mismatch is rejected at
//! validation time and never coerced.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Id, Scalar, ValueType};
use crate::error::{Issue, RecordKind};

use super::check::{describe, FieldPath, Fields};
use super::Schema;

/// A single attribute, e.g. `strength`, `is_dead`, `crit_rate`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeComponent {
    pub id: String,
    pub owner_uuid: Id,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value_type: ValueType,
    /// Stored verbatim; see [`AttributeComponent::scalar`].
    #[serde(default)]
    pub value: Value,
}

impl AttributeComponent {
    /// Create an attribute with an explicit type and raw value.
    pub fn new(
        id: impl Into<String>,
        owner: impl Into<Id>,
        name: impl Into<String>,
        value_type: ValueType,
        value: Value,
    ) -> Self {
        Self {
            id: id.into(),
            owner_uuid: owner.into(),
            name: name.into(),
            description: None,
            value_type,
            value,
        }
    }

    /// Create an `int` attribute.
    pub fn int(id: impl Into<String>, owner: impl Into<Id>, name: impl Into<String>, value: i64) -> Self {
        Self::new(id, owner, name, ValueType::Int, Value::from(value))
    }

    /// Create a `float` attribute.
    pub fn float(id: impl Into<String>, owner: impl Into<Id>, name: impl Into<String>, value: f64) -> Self {
        Self::new(id, owner, name, ValueType::Float, Value::from(value))
    }

    /// Create a `bool` attribute.
    pub fn flag(id: impl Into<String>, owner: impl Into<Id>, name: impl Into<String>, value: bool) -> Self {
        Self::new(id, owner, name, ValueType::Bool, Value::from(value))
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Typed value, or `None` when `value` does not match `valueType`.
    ///
    /// Integral floats such as `100.0` read as `Int(100)`. `int` admits only
    /// values in `i64` range, so the conversion never saturates.
    #[must_use]
    pub fn scalar(&self) -> Option<Scalar> {
        if !self.value_type.accepts(&self.value) {
            return None;
        }
        match self.value_type {
            ValueType::Int => self
                .value
                .as_i64()
                .or_else(|| self.value.as_f64().map(|f| f as i64))
                .map(Scalar::Int),
            ValueType::Float => self.value.as_f64().map(Scalar::Float),
            ValueType::Bool => self.value.as_bool().map(Scalar::Bool),
        }
    }
}

impl Schema for AttributeComponent {
    const KIND: RecordKind = RecordKind::Attribute;

    fn shape(value: &Value, at: &FieldPath, issues: &mut Vec<Issue>) {
        let mut fields = Fields::of(value, at, issues);
        if !fields.is_object() {
            return;
        }
        fields
            .string("id")
            .id("ownerUuid")
            .string("name")
            .opt_string("description");
        fields.one_of("valueType", &["int", "bool", "float"]);
    }

    fn check(&self, at: &FieldPath, issues: &mut Vec<Issue>) {
        if !self.value_type.accepts(&self.value) {
            let wanted = match self.value_type {
                ValueType::Int => "an integer",
                ValueType::Float => "a number",
                ValueType::Bool => "a boolean",
            };
            at.field("value").issue(
                issues,
                format!(
                    "valueType '{}' requires {}, got {}",
                    self.value_type,
                    wanted,
                    describe(&self.value)
                ),
            );
        }
    }
}
