//! Runtime values for attributes, stats, and variables.
//!
//! Attributes declare a [`ValueType`] and store their value verbatim as JSON.
//! Evaluation works on [`Scalar`], the resolved form of such a value.
//!
//! ## Scalar Types
//!
//! - `Int`: Integral numbers (hp, level, stacks)
//! - `Float`: Fractional numbers (crit rate, multipliers)
//! - `Bool`: Flags (is_dead, is_stunned)
//! - `Text`: Strings (element, stance); only produced by conditions and variables

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of an attribute value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    Bool,
    Float,
}

impl ValueType {
    /// Wire name of this type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Float => "float",
        }
    }

    /// Check whether a raw JSON value satisfies this type.
    ///
    /// `int` accepts any integral number in `i64` range (including `100.0`),
    /// `float` any number, and `bool` only `true`/`false`. Nothing is
    /// coerced.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ValueType::Int => is_integral(value),
            ValueType::Float => value.as_f64().is_some_and(f64::is_finite),
            ValueType::Bool => value.is_boolean(),
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Check whether a JSON value is an integral number that fits in `i64`.
#[must_use]
pub fn is_integral(value: &Value) -> bool {
    // 2^63, exactly representable
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    match value {
        Value::Number(n) => {
            n.is_i64()
                || (!n.is_u64()
                    && n.as_f64().is_some_and(|f| f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)))
        }
        _ => false,
    }
}

/// A resolved runtime value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Convert a JSON value. Arrays, objects, and null have no scalar form.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Scalar::Int(i)),
                None => n.as_f64().map(Scalar::Float),
            },
            Value::String(s) => Some(Scalar::Text(s.clone())),
            _ => None,
        }
    }

    /// Convert back to JSON. Non-finite floats become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::from(*i),
            Scalar::Float(f) => Value::from(*f),
            Scalar::Text(s) => Value::String(s.clone()),
        }
    }

    /// Get as a number if this is `Int` or `Float`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as integer if this is an `Int` value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as bool if this is a `Bool` value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as string slice if this is a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short type label for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Text(_) => "text",
        }
    }

    /// Equality across numeric kinds (`3 == 3.0`); other kinds compare only
    /// with themselves.
    #[must_use]
    pub fn loosely_equals(&self, other: &Scalar) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (self, other) {
                (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
                (Scalar::Text(a), Scalar::Text(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Ordering between numbers, or between strings. `None` for any other
    /// pairing (or NaN).
    #[must_use]
    pub fn ordering(&self, other: &Scalar) -> Option<Ordering> {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => match (self, other) {
                (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
                _ => None,
            },
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "{:?}", s),
        }
    }
}
