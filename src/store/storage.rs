//! Durable snapshot storage.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::error::PersistenceError;

/// Key-value storage for serialized snapshots.
pub trait SnapshotStorage {
    /// Read the payload under `key`. `None` when nothing was saved yet.
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Replace the payload under `key`.
    fn save(&mut self, key: &str, payload: &str) -> Result<(), PersistenceError>;
}

/// In-process storage.
///
/// Clones share the same map, the way several tabs share one origin's
/// storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<FxHashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with one payload.
    #[must_use]
    pub fn seeded(key: impl Into<String>, payload: impl Into<String>) -> Self {
        let storage = Self::new();
        if let Ok(mut slots) = storage.slots.lock() {
            slots.insert(key.into(), payload.into());
        }
        storage
    }

    fn poisoned() -> PersistenceError {
        PersistenceError::Io(io::Error::other("memory storage lock poisoned"))
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let slots = self.slots.lock().map_err(|_| Self::poisoned())?;
        Ok(slots.get(key).cloned())
    }

    fn save(&mut self, key: &str, payload: &str) -> Result<(), PersistenceError> {
        let mut slots = self.slots.lock().map_err(|_| Self::poisoned())?;
        slots.insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

/// One JSON file per key under a directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// reader never sees a half-written snapshot.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, key: &str, payload: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}
