//! Replica broadcast transport.
//!
//! A [`SyncHub`] is one named channel; each replica holds a [`SyncLink`]
//! to it. Messages are full serialized snapshots. A link never receives
//! its own messages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

use crate::core::StoreConfig;

/// Transport a store uses to reach the other replicas.
pub trait Replication {
    /// Send a payload to every other connected replica.
    ///
    /// Returns how many replicas it was queued for.
    fn publish(&self, payload: Arc<str>) -> usize;

    /// Next payload from another replica, if one is waiting.
    fn try_next(&mut self) -> Option<Arc<str>>;
}

#[derive(Clone, Debug)]
struct Envelope {
    origin: u64,
    payload: Arc<str>,
}

/// A named broadcast channel shared by replicas.
#[derive(Clone, Debug)]
pub struct SyncHub {
    name: Arc<str>,
    sender: broadcast::Sender<Envelope>,
    next_link: Arc<AtomicU64>,
}

impl SyncHub {
    /// Create a hub. `capacity` is how many messages a slow replica may
    /// fall behind before it starts skipping.
    ///
    /// Panics if `capacity` is zero.
    pub fn new(name: impl Into<Arc<str>>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            name: name.into(),
            sender,
            next_link: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.channel_name.as_str(), config.channel_capacity)
    }

    /// Connect a new replica. It only sees messages sent after this call.
    pub fn connect(&self) -> SyncLink {
        SyncLink {
            id: self.next_link.fetch_add(1, Ordering::Relaxed),
            channel: Arc::clone(&self.name),
            sender: self.sender.clone(),
            receiver: self.sender.subscribe(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of connected replicas.
    #[must_use]
    pub fn replicas(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// One replica's connection to a [`SyncHub`].
#[derive(Debug)]
pub struct SyncLink {
    id: u64,
    channel: Arc<str>,
    sender: broadcast::Sender<Envelope>,
    receiver: broadcast::Receiver<Envelope>,
}

impl SyncLink {
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Number of other replicas on the hub.
    #[must_use]
    pub fn peers(&self) -> usize {
        self.sender.receiver_count().saturating_sub(1)
    }
}

impl Replication for SyncLink {
    fn publish(&self, payload: Arc<str>) -> usize {
        let envelope = Envelope { origin: self.id, payload };
        // Ignore errors if no receivers
        match self.sender.send(envelope) {
            Ok(_) => self.peers(),
            Err(_) => 0,
        }
    }

    fn try_next(&mut self) -> Option<Arc<str>> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) if envelope.origin == self.id => continue,
                Ok(envelope) => return Some(envelope.payload),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(channel = %self.channel, skipped, "replica fell behind, skipping to newer snapshots");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

/// A store that replicates nowhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct Detached;

impl Replication for Detached {
    fn publish(&self, _payload: Arc<str>) -> usize {
        0
    }

    fn try_next(&mut self) -> Option<Arc<str>> {
        None
    }
}
