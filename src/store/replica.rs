//! One replica of the battle graph.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::{Id, StoreConfig};
use crate::error::{SerializationError, StoreError};
use crate::schema::Schema;

use super::{with_record_type, BattleState, Collection, PartialSnapshot, Record, Replication, SnapshotStorage};

/// Last step a replica completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorePhase {
    /// Opened from storage or defaults, or just applied a remote snapshot.
    Loaded,
    /// Holds local changes that are neither stored nor sent.
    Mutating,
    /// Local changes are stored but no other replica was listening.
    Persisted,
    /// Local changes were sent to at least one other replica.
    Broadcast,
}

/// Outcome of the persist-and-broadcast step after a mutation.
///
/// Neither failure undoes the mutation: the in-memory snapshot stays
/// authoritative until the next successful commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commit {
    /// The snapshot reached durable storage.
    pub persisted: bool,
    /// Number of other replicas the snapshot was sent to.
    pub delivered: usize,
}

/// A replica's store: the live snapshot plus its storage and transport.
///
/// Every mutation is validated first and rejected whole on failure. On
/// success the full snapshot is written to storage and broadcast.
#[derive(Debug)]
pub struct BattleStore<S, L> {
    config: StoreConfig,
    state: BattleState,
    storage: S,
    link: L,
    phase: StorePhase,
}

impl<S: SnapshotStorage, L: Replication> BattleStore<S, L> {
    /// Open a replica from the persisted snapshot, or the default snapshot
    /// when none is stored or the stored one is unusable.
    pub fn open(config: StoreConfig, storage: S, link: L) -> Self {
        let state = match storage.load(&config.storage_key) {
            Ok(Some(payload)) => match BattleState::from_json(&payload) {
                Ok(state) => {
                    info!(key = %config.storage_key, "loaded persisted snapshot");
                    state
                }
                Err(e) => {
                    warn!(key = %config.storage_key, error = %e, "persisted snapshot unusable, using default");
                    BattleState::default()
                }
            },
            Ok(None) => {
                info!(key = %config.storage_key, "no persisted snapshot, using default");
                BattleState::default()
            }
            Err(e) => {
                warn!(key = %config.storage_key, error = %e, "failed to read storage, using default");
                BattleState::default()
            }
        };

        Self {
            config,
            state,
            storage,
            link,
            phase: StorePhase::Loaded,
        }
    }

    /// The live snapshot.
    #[must_use]
    pub fn state(&self) -> &BattleState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> StorePhase {
        self.phase
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get a record by key.
    #[must_use]
    pub fn get<R: Record>(&self, key: &Id) -> Option<&R> {
        self.state.get(key)
    }

    /// All records of one type, in order.
    #[must_use]
    pub fn records<R: Record>(&self) -> &im::Vector<R> {
        R::items(&self.state)
    }

    // === Mutations ===

    /// Validate and append a record.
    pub fn add<R: Record>(&mut self, record: R) -> Result<Commit, StoreError> {
        record.validate()?;
        let key = record.key();
        if self.state.position::<R>(&key).is_some() {
            return Err(StoreError::DuplicateKey { collection: R::COLLECTION, key });
        }

        R::items_mut(&mut self.state).push_back(record);
        debug!(collection = %R::COLLECTION, key = %key, "record added");
        Ok(self.mutated())
    }

    /// Validate and replace the record stored under `key`.
    ///
    /// The replacement may carry a different key, as long as no other record
    /// uses it.
    pub fn update<R: Record>(&mut self, key: &Id, record: R) -> Result<Commit, StoreError> {
        record.validate()?;
        let Some(index) = self.state.position::<R>(key) else {
            return Err(StoreError::NotFound { collection: R::COLLECTION, key: key.clone() });
        };
        let new_key = record.key();
        if new_key != *key && self.state.position::<R>(&new_key).is_some() {
            return Err(StoreError::DuplicateKey { collection: R::COLLECTION, key: new_key });
        }

        R::items_mut(&mut self.state).set(index, record);
        debug!(collection = %R::COLLECTION, key = %key, "record updated");
        Ok(self.mutated())
    }

    /// Remove the record stored under `key`.
    ///
    /// Records owned by it are left in place.
    pub fn remove<R: Record>(&mut self, key: &Id) -> Result<Commit, StoreError> {
        let Some(index) = self.state.position::<R>(key) else {
            return Err(StoreError::NotFound { collection: R::COLLECTION, key: key.clone() });
        };

        R::items_mut(&mut self.state).remove(index);
        debug!(collection = %R::COLLECTION, key = %key, "record removed");
        Ok(self.mutated())
    }

    /// Parse raw JSON for `collection` and add it.
    pub fn add_json(&mut self, collection: Collection, value: &Value) -> Result<Commit, StoreError> {
        with_record_type!(collection, R => {
            let record = R::parse(value)?;
            self.add(record)
        })
    }

    /// Parse raw JSON for `collection` and replace the record under `key`.
    pub fn update_json(&mut self, collection: Collection, key: &Id, value: &Value) -> Result<Commit, StoreError> {
        with_record_type!(collection, R => {
            let record = R::parse(value)?;
            self.update(key, record)
        })
    }

    /// Remove the record under `key` from `collection`.
    pub fn remove_in(&mut self, collection: Collection, key: &Id) -> Result<Commit, StoreError> {
        with_record_type!(collection, R => self.remove::<R>(key))
    }

    fn mutated(&mut self) -> Commit {
        self.phase = StorePhase::Mutating;
        self.commit()
    }

    /// Write the snapshot to storage and send it to the other replicas.
    ///
    /// Runs after every mutation. Failures are logged and reported in the
    /// returned [`Commit`], never raised.
    pub fn commit(&mut self) -> Commit {
        let payload = match self.state.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to encode snapshot");
                return Commit { persisted: false, delivered: 0 };
            }
        };

        let persisted = self.persist(&payload);
        let delivered = self.link.publish(Arc::from(payload));

        if delivered > 0 {
            self.phase = StorePhase::Broadcast;
        } else if persisted {
            self.phase = StorePhase::Persisted;
        }
        Commit { persisted, delivered }
    }

    fn persist(&mut self, payload: &str) -> bool {
        match self.storage.save(&self.config.storage_key, payload) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.config.storage_key, error = %e, "failed to persist snapshot");
                false
            }
        }
    }

    // === Replication ===

    /// Apply a snapshot received from another replica.
    ///
    /// Each collection present in the payload replaces the local one;
    /// absent collections are kept. The snapshot is not re-broadcast.
    pub fn apply_remote(&mut self, payload: &str) -> Result<Vec<Collection>, SerializationError> {
        let value: Value = serde_json::from_str(payload)?;
        let partial = PartialSnapshot::from_value(&value, self.config.validate_remote)?;
        let replaced = partial.apply_to(&mut self.state);
        debug!(channel = %self.config.channel_name, collections = replaced.len(), "applied remote snapshot");

        if self.config.persist_remote {
            self.persist(payload);
        }
        self.phase = StorePhase::Loaded;
        Ok(replaced)
    }

    /// Apply every snapshot waiting on the link, oldest first.
    ///
    /// Unusable payloads are logged and dropped. Returns how many were
    /// applied.
    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        while let Some(payload) = self.link.try_next() {
            match self.apply_remote(&payload) {
                Ok(_) => applied += 1,
                Err(e) => warn!(channel = %self.config.channel_name, error = %e, "dropping remote snapshot"),
            }
        }
        applied
    }
}
