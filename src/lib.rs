//! # battle-lab
//!
//! Data model and runtime core for a battle-ruleset editor.
//!
//! ## Design Principles
//!
//! 1. **Validate at the boundary**: every record is checked against its
//!    schema before it enters the graph. Failures list every offending
//!    field by path.
//!
//! 2. **Errors, not defaults**: a condition or regulator that cannot be
//!    resolved against live state is an error, never a silent `false` or `0`.
//!
//! 3. **Explicit side effects**: persistence and replication happen in one
//!    visible `commit` step after each mutation.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: snapshot collections are `im` vectors,
//!   so cloning the graph for storage or broadcast is O(1).
//!
//! - **Whole-Snapshot Replication**: replicas exchange full snapshots and
//!   the last one applied wins.
//!
//! ## Modules
//!
//! - `core`: identifiers, runtime values, RNG, configuration
//! - `schema`: record types and their validators
//! - `conditions`: condition evaluation against a [`GameView`]
//! - `triggers`: recursive trigger trees
//! - `regulators`: dynamic value adjustments
//! - `effects`: behavior and effect resolution
//! - `store`: the replicated snapshot store

pub mod core;
pub mod error;
pub mod schema;
pub mod conditions;
pub mod triggers;
pub mod regulators;
pub mod effects;
pub mod store;

// Re-export commonly used types
pub use crate::core::{BattleRng, Id, Scalar, StoreConfig, ValueType};

pub use crate::error::{
    Issue, PersistenceError, RecordKind, ResolutionError, SerializationError, StoreError,
    ValidationError,
};

pub use crate::schema::{
    AttributeComponent, Behavior, BehaviorEffect, CompareOp, Condition, EffectCondition,
    EffectRegulator, EntityReference, EntityType, Regulator, Schema, StatsBundle,
};

pub use crate::conditions::{ConditionEvaluator, EvalContext, GameView};

pub use crate::triggers::{Trigger, TriggerEvaluator, TriggerNode};

pub use crate::regulators::RegulatorCalculator;

pub use crate::effects::EffectResolver;

pub use crate::store::{
    BattleState, BattleStore, Collection, Commit, FileStorage, MemoryStorage, SyncHub,
};
