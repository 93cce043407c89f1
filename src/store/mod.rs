//! Synchronized battle-graph store.
//!
//! Each replica (tab, window, process) owns a [`BattleStore`] holding its own
//! copy of the snapshot. Every local mutation is validated, applied, written
//! to durable storage, and broadcast as a full snapshot to the other
//! replicas. Incoming snapshots overwrite local collections wholesale.
//!
//! ## Key Components
//!
//! - [`BattleState`]: the snapshot, six ordered collections
//! - [`Collection`] / [`Record`]: collection names and their record types
//! - [`SnapshotStorage`]: durable storage ([`MemoryStorage`], [`FileStorage`])
//! - [`Replication`]: the broadcast transport ([`SyncHub`] / [`SyncLink`], [`Detached`])
//!
//! ## Consistency
//!
//! Last write wins at whole-snapshot granularity. Two replicas editing
//! between broadcasts do not merge: whichever snapshot is applied last
//! replaces the other. A replica never receives its own broadcasts.
//!
//! ## Example Usage
//!
//! ```
//! use battle_lab::core::StoreConfig;
//! use battle_lab::schema::AttributeComponent;
//! use battle_lab::store::{BattleStore, MemoryStorage, SyncHub};
//!
//! let config = StoreConfig::new();
//! let hub = SyncHub::from_config(&config);
//! let storage = MemoryStorage::new();
//!
//! let mut a = BattleStore::open(config.clone(), storage.clone(), hub.connect());
//! let mut b = BattleStore::open(config, storage, hub.connect());
//!
//! a.add(AttributeComponent::int("def", "char-001", "DEF", 8)).unwrap();
//! assert_eq!(b.sync(), 1);
//! assert!(b.get::<AttributeComponent>(&"def".into()).is_some());
//! ```

mod snapshot;
mod storage;
mod channel;
mod replica;

use std::fmt::Debug;

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::Id;
use crate::schema::{AttributeComponent, Condition, EntityReference, Regulator, Schema, StatsBundle};
use crate::triggers::Trigger;

pub use snapshot::{BattleState, PartialSnapshot};
pub use storage::{FileStorage, MemoryStorage, SnapshotStorage};
pub use channel::{Detached, Replication, SyncHub, SyncLink};
pub use replica::{BattleStore, Commit, StorePhase};

/// A named collection of the snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Entities,
    Attributes,
    StatsBundles,
    Conditions,
    Triggers,
    Regulators,
}

impl Collection {
    /// All collections, in snapshot order.
    pub const ALL: [Collection; 6] = [
        Collection::Entities,
        Collection::Attributes,
        Collection::StatsBundles,
        Collection::Conditions,
        Collection::Triggers,
        Collection::Regulators,
    ];

    /// Wire name, e.g. `statsBundles`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Collection::Entities => "entities",
            Collection::Attributes => "attributes",
            Collection::StatsBundles => "statsBundles",
            Collection::Conditions => "conditions",
            Collection::Triggers => "triggers",
            Collection::Regulators => "regulators",
        }
    }

    /// Look up a collection by wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Field records are keyed on: `uuid` or `id`.
    #[must_use]
    pub const fn key_field(self) -> &'static str {
        match self {
            Collection::Entities | Collection::StatsBundles | Collection::Triggers => "uuid",
            Collection::Attributes | Collection::Conditions | Collection::Regulators => "id",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A record type stored in one snapshot collection.
pub trait Record: Schema + Clone + Serialize + Debug {
    const COLLECTION: Collection;

    /// Value of the record's key field.
    fn key(&self) -> Id;

    fn items(state: &BattleState) -> &Vector<Self>;

    fn items_mut(state: &mut BattleState) -> &mut Vector<Self>;
}

macro_rules! impl_record {
    ($ty:ty, $collection:expr, $field:ident, |$r:ident| $key:expr) => {
        impl Record for $ty {
            const COLLECTION: Collection = $collection;

            fn key(&self) -> Id {
                let $r = self;
                $key
            }

            fn items(state: &BattleState) -> &Vector<Self> {
                &state.$field
            }

            fn items_mut(state: &mut BattleState) -> &mut Vector<Self> {
                &mut state.$field
            }
        }
    };
}

impl_record!(EntityReference, Collection::Entities, entities, |r| r.uuid.clone());
impl_record!(AttributeComponent, Collection::Attributes, attributes, |r| Id::from(&r.id));
impl_record!(StatsBundle, Collection::StatsBundles, stats_bundles, |r| r.uuid.clone());
impl_record!(Condition, Collection::Conditions, conditions, |r| Id::from(&r.id));
impl_record!(Trigger, Collection::Triggers, triggers, |r| r.uuid.clone());
impl_record!(Regulator, Collection::Regulators, regulators, |r| Id::from(&r.id));

/// Run `$body` with `$r` aliased to the record type of `$collection`.
macro_rules! with_record_type {
    ($collection:expr, $r:ident => $body:expr) => {
        match $collection {
            $crate::store::Collection::Entities => {
                type $r = $crate::schema::EntityReference;
                $body
            }
            $crate::store::Collection::Attributes => {
                type $r = $crate::schema::AttributeComponent;
                $body
            }
            $crate::store::Collection::StatsBundles => {
                type $r = $crate::schema::StatsBundle;
                $body
            }
            $crate::store::Collection::Conditions => {
                type $r = $crate::schema::Condition;
                $body
            }
            $crate::store::Collection::Triggers => {
                type $r = $crate::triggers::Trigger;
                $body
            }
            $crate::store::Collection::Regulators => {
                type $r = $crate::schema::Regulator;
                $body
            }
        }
    };
}

pub(crate) use with_record_type;
