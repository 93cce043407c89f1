//! Store configuration.
//!
//! Replicas configure the store at startup with a [`StoreConfig`]. Every
//! replica of one logical graph must agree on `storage_key` and
//! `channel_name`; the rest is local policy.

use serde::{Deserialize, Serialize};

/// Default durable storage key for the snapshot.
pub const DEFAULT_STORAGE_KEY: &str = "BATTLE_LAB_STATE";

/// Default name of the replica broadcast channel.
pub const DEFAULT_CHANNEL_NAME: &str = "BATTLE_LAB_SYNC";

/// Configuration for a [`BattleStore`](crate::store::BattleStore) replica.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key under which the serialized snapshot is stored.
    pub storage_key: String,

    /// Name of the shared broadcast channel (for logging and hub lookup).
    pub channel_name: String,

    /// Buffered messages per receiver before it starts lagging.
    pub channel_capacity: usize,

    /// Write remote snapshots to this replica's storage as well.
    ///
    /// Off by default: replicas usually share storage, and the sender has
    /// already written it.
    pub persist_remote: bool,

    /// Run record validation over incoming snapshots and drop invalid ones.
    pub validate_remote: bool,
}

impl StoreConfig {
    /// Create a configuration with default names.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            channel_capacity: 64,
            persist_remote: false,
            validate_remote: true,
        }
    }

    /// Set the storage key.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the channel name.
    #[must_use]
    pub fn with_channel_name(mut self, name: impl Into<String>) -> Self {
        self.channel_name = name.into();
        self
    }

    /// Set the per-receiver channel capacity.
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be at least 1");
        self.channel_capacity = capacity;
        self
    }

    /// Persist snapshots received from other replicas.
    #[must_use]
    pub fn persist_remote(mut self) -> Self {
        self.persist_remote = true;
        self
    }

    /// Accept remote snapshots without validating their records.
    #[must_use]
    pub fn trust_remote(mut self) -> Self {
        self.validate_remote = false;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
