//! Error types.
//!
//! - [`ValidationError`]: a record failed structural or cross-field checks;
//!   carries every issue found, keyed by field path.
//! - [`StoreError`]: a mutation was rejected; the snapshot is unchanged.
//! - [`ResolutionError`]: a condition or regulator referenced state that
//!   could not be resolved against the live graph.
//! - [`PersistenceError`]: durable storage read/write failed.
//! - [`SerializationError`]: an incoming snapshot payload was unusable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Id;
use crate::store::Collection;

/// Kind of record being validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Entity,
    Attribute,
    StatsBundle,
    Condition,
    EffectCondition,
    Trigger,
    TriggerNode,
    Regulator,
    EffectRegulator,
    Behavior,
    BehaviorEffect,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::Entity => "entity",
            RecordKind::Attribute => "attribute",
            RecordKind::StatsBundle => "stats bundle",
            RecordKind::Condition => "condition",
            RecordKind::EffectCondition => "effect condition",
            RecordKind::Trigger => "trigger",
            RecordKind::TriggerNode => "trigger node",
            RecordKind::Regulator => "regulator",
            RecordKind::EffectRegulator => "effect regulator",
            RecordKind::Behavior => "behavior",
            RecordKind::BehaviorEffect => "behavior effect",
        };
        f.write_str(name)
    }
}

/// One violated constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Dotted field path, e.g. `root.left.condition.op`. Empty for the record itself.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// A record failed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: RecordKind,
    pub issues: Vec<Issue>,
}

impl ValidationError {
    /// Find the first issue reported at `path`.
    #[must_use]
    pub fn issue_at(&self, path: &str) -> Option<&Issue> {
        self.issues.iter().find(|i| i.path == path)
    }

    /// All reported paths, in report order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(|i| i.path.as_str())
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}", self.kind)?;
        for (i, issue) in self.issues.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A store mutation was rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no record with key {key} in {collection}")]
    NotFound { collection: Collection, key: Id },

    #[error("key {key} already exists in {collection}")]
    DuplicateKey { collection: Collection, key: Id },
}

impl StoreError {
    /// Check if this is a not-found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// A condition or regulator could not be resolved against live state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("entity {0} not found")]
    UnknownEntity(Id),

    #[error("role {0} is not bound in this context")]
    UnboundRole(&'static str),

    #[error("entity {entity} has no stats bundle")]
    NoStatsBundle { entity: Id },

    #[error("stat {stat:?} not found on {holder}")]
    UnresolvedStat { holder: Id, stat: String },

    #[error("variable {variable:?} not set on {entity}")]
    UnresolvedVariable { entity: Id, variable: String },

    #[error("maximum {max:?} for {stat:?} not found")]
    MissingMaximum { stat: String, max: String },

    #[error("maximum {max:?} is zero")]
    ZeroMaximum { max: String },

    #[error("{0} is not numeric")]
    NotNumeric(String),

    #[error("nothing to check: {0}")]
    MissingSubject(&'static str),

    #[error("operator {0} needs a comparison value")]
    MissingOperand(&'static str),

    #[error("cannot compare {subject} with {target} using {op}")]
    Incomparable {
        op: &'static str,
        subject: &'static str,
        target: &'static str,
    },

    #[error("regulator parameter {0} is not set")]
    MissingParameter(&'static str),

    #[error("chance condition needs a random source")]
    NoRandomSource,

    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("trigger tree is nested deeper than {0} levels")]
    TreeTooDeep(usize),
}

/// Durable storage failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An incoming snapshot payload was unusable.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("snapshot rejected: {0}")]
    Invalid(#[from] ValidationError),
}
