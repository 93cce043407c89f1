//! Record identifiers.
//!
//! Every record in the battle graph is keyed by an `Id`, which is either a
//! string or an integer. The two spaces never overlap: `"5"` and `5` are
//! different keys.
//!
//! ```
//! use battle_lab::core::Id;
//!
//! let hero = Id::from("char-001");
//! let legacy = Id::from(7);
//!
//! assert_eq!(hero.as_str(), Some("char-001"));
//! assert_eq!(legacy.as_int(), Some(7));
//! assert_ne!(Id::from("7"), legacy);
//! ```

use serde::{Deserialize, Serialize};

/// Identifier for entities, attributes, bundles, conditions, triggers, and regulators.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier.
    Int(i64),
    /// String identifier (uuid or slug).
    Text(String),
}

impl Id {
    /// Get as string slice if this is a text id.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Id::Text(s) => Some(s),
            Id::Int(_) => None,
        }
    }

    /// Get as integer if this is a numeric id.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Id::Int(v) => Some(*v),
            Id::Text(_) => None,
        }
    }

    /// Check whether this id names the given string key.
    #[must_use]
    pub fn is(&self, key: &str) -> bool {
        self.as_str() == Some(key)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::Text(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::Text(s)
    }
}

impl From<&String> for Id {
    fn from(s: &String) -> Self {
        Id::Text(s.clone())
    }
}

impl From<i64> for Id {
    fn from(v: i64) -> Self {
        Id::Int(v)
    }
}

impl From<i32> for Id {
    fn from(v: i32) -> Self {
        Id::Int(v as i64)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Id::Int(v) => write!(f, "{}", v),
            Id::Text(s) => write!(f, "{:?}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_int_are_distinct() {
        assert_ne!(Id::from("5"), Id::from(5));
        assert_eq!(Id::from("5"), Id::Text("5".to_string()));
    }

    #[test]
    fn test_untagged_json() {
        let ids: Vec<Id> = serde_json::from_str(r#"["char-001", 42]"#).unwrap();
        assert_eq!(ids, vec![Id::from("char-001"), Id::from(42)]);

        let json = serde_json::to_string(&ids).unwrap();
        assert_eq!(json, r#"["char-001",42]"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Id::from(3)), "3");
        assert_eq!(format!("{}", Id::from("hp")), "\"hp\"");
    }

    #[test]
    fn test_is() {
        assert!(Id::from("hp").is("hp"));
        assert!(!Id::from(1).is("1"));
    }
}
