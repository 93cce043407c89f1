//! Structural checks over raw JSON records.
//!
//! Serde stops at the first type error. Records arriving from an editor need
//! every problem reported at once, so each kind first walks its JSON with
//! [`Fields`] and only deserializes when the shape is sound.

use serde_json::{Map, Value};

use crate::core::is_integral;
use crate::error::Issue;

/// Dotted path to a field inside a record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    /// Path of the record itself.
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Path of a named child field.
    #[must_use]
    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    /// Path of an array element.
    #[must_use]
    pub fn index(&self, i: usize) -> Self {
        self.field(&i.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Record an issue at this path.
    pub fn issue(&self, issues: &mut Vec<Issue>, message: impl Into<String>) {
        issues.push(Issue::new(self.0.clone(), message));
    }
}

/// Field-by-field checker for one JSON object.
///
/// `null` counts as absent, matching how optional fields deserialize.
pub struct Fields<'v, 'i> {
    obj: Option<&'v Map<String, Value>>,
    at: FieldPath,
    issues: &'i mut Vec<Issue>,
}

impl<'v, 'i> Fields<'v, 'i> {
    /// Start checking `value`, which must be an object.
    pub fn of(value: &'v Value, at: &FieldPath, issues: &'i mut Vec<Issue>) -> Self {
        let obj = value.as_object();
        if obj.is_none() {
            at.issue(issues, format!("expected object, got {}", describe(value)));
        }
        Self {
            obj,
            at: at.clone(),
            issues,
        }
    }

    /// Whether the value was an object at all.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.obj.is_some()
    }

    /// Issue sink, for nested records.
    pub fn issues(&mut self) -> &mut Vec<Issue> {
        &mut *self.issues
    }

    /// Path of a field of this object.
    #[must_use]
    pub fn path(&self, name: &str) -> FieldPath {
        self.at.field(name)
    }

    /// Raw field value, `None` when absent or null.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'v Value> {
        self.obj?.get(name).filter(|v| !v.is_null())
    }

    fn fail(&mut self, name: &str, message: String) {
        self.at.field(name).issue(self.issues, message);
    }

    fn required(&mut self, name: &str) -> Option<&'v Value> {
        self.obj?;
        let value = self.get(name);
        if value.is_none() {
            self.fail(name, "required".to_string());
        }
        value
    }

    fn expect(&mut self, name: &str, value: &Value, ok: bool, wanted: &str) {
        if !ok {
            self.fail(name, format!("expected {}, got {}", wanted, describe(value)));
        }
    }

    /// Required string.
    pub fn string(&mut self, name: &str) -> &mut Self {
        if let Some(v) = self.required(name) {
            self.expect(name, v, v.is_string(), "string");
        }
        self
    }

    /// Optional string.
    pub fn opt_string(&mut self, name: &str) -> &mut Self {
        if let Some(v) = self.get(name) {
            self.expect(name, v, v.is_string(), "string");
        }
        self
    }

    /// Required identifier (string or integer).
    pub fn id(&mut self, name: &str) -> &mut Self {
        if let Some(v) = self.required(name) {
            self.expect(name, v, is_id(v), "string or integer id");
        }
        self
    }

    /// Optional identifier.
    pub fn opt_id(&mut self, name: &str) -> &mut Self {
        if let Some(v) = self.get(name) {
            self.expect(name, v, is_id(v), "string or integer id");
        }
        self
    }

    /// Optional number.
    pub fn opt_number(&mut self, name: &str) -> &mut Self {
        if let Some(v) = self.get(name) {
            self.expect(name, v, v.is_number(), "number");
        }
        self
    }

    /// Optional integer.
    pub fn opt_integer(&mut self, name: &str) -> &mut Self {
        if let Some(v) = self.get(name) {
            self.expect(name, v, is_integral(v), "integer");
        }
        self
    }

    /// Optional number within `[0, 1]`.
    pub fn opt_fraction(&mut self, name: &str) -> &mut Self {
        if let Some(v) = self.get(name) {
            let ok = v.as_f64().is_some_and(|f| (0.0..=1.0).contains(&f));
            self.expect(name, v, ok, "number in [0, 1]");
        }
        self
    }

    /// Required string drawn from `allowed`. Returns the value when valid.
    pub fn one_of(&mut self, name: &str, allowed: &[&str]) -> Option<&'v str> {
        let v = self.required(name)?;
        self.check_choice(name, v, allowed)
    }

    /// Optional string drawn from `allowed`.
    pub fn opt_one_of(&mut self, name: &str, allowed: &[&str]) -> Option<&'v str> {
        let v = self.get(name)?;
        self.check_choice(name, v, allowed)
    }

    fn check_choice(&mut self, name: &str, v: &'v Value, allowed: &[&str]) -> Option<&'v str> {
        match v.as_str() {
            Some(s) if allowed.contains(&s) => Some(s),
            _ => {
                self.fail(
                    name,
                    format!("expected one of {}, got {}", allowed.join(", "), describe(v)),
                );
                None
            }
        }
    }

    /// Optional literal string.
    pub fn opt_literal(&mut self, name: &str, literal: &str) -> &mut Self {
        self.opt_one_of(name, &[literal]);
        self
    }

    /// Optional array of identifiers.
    pub fn ids(&mut self, name: &str) -> &mut Self {
        self.each(name, is_id, "string or integer id");
        self
    }

    /// Optional array of strings.
    pub fn strings(&mut self, name: &str) -> &mut Self {
        self.each(name, Value::is_string, "string");
        self
    }

    fn each(&mut self, name: &str, ok: fn(&Value) -> bool, wanted: &str) {
        let Some(items) = self.array(name) else {
            return;
        };
        let path = self.at.field(name);
        for (i, item) in items.iter().enumerate() {
            if !ok(item) {
                path.index(i).issue(
                    self.issues,
                    format!("expected {}, got {}", wanted, describe(item)),
                );
            }
        }
    }

    /// Optional array; reports a non-array value.
    pub fn array(&mut self, name: &str) -> Option<&'v Vec<Value>> {
        let v = self.get(name)?;
        let items = v.as_array();
        if items.is_none() {
            self.fail(name, format!("expected array, got {}", describe(v)));
        }
        items
    }

    /// Required nested value (object shape is checked by the nested kind).
    pub fn nested(&mut self, name: &str) -> Option<&'v Value> {
        self.required(name)
    }
}

fn is_id(v: &Value) -> bool {
    v.is_string() || v.as_i64().is_some()
}

/// Short rendering of a value for messages.
#[must_use]
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
        other => other.to_string(),
    }
}
