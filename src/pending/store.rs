//! Durable marker storage.
//!
//! One logical record per entity id, behind a minimal key-value trait so a
//! directory of files, an embedded KV store, or a database row are all
//! valid backends. The default [`FileMarkerStore`] writes one small
//! `<id>.txt` per entity, which survives process restarts and needs no
//! cross-entity transaction.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::entity::EntityId;
use crate::error::StoreError;

/// Minimal durable key-value contract for pending-action markers.
pub trait MarkerStore: Send + Sync {
    /// Reads the raw marker for an entity, `None` if absent.
    fn get(&self, id: EntityId) -> Result<Option<String>, StoreError>;

    /// Writes (or overwrites) the raw marker for an entity.
    fn put(&self, id: EntityId, marker: &str) -> Result<(), StoreError>;

    /// Deletes the marker for an entity. Deleting an absent marker is not
    /// an error.
    fn delete(&self, id: EntityId) -> Result<(), StoreError>;

    /// Entity ids that currently have a marker.
    fn list(&self) -> Result<Vec<EntityId>, StoreError>;
}

/// File-per-entity marker store.
#[derive(Debug)]
pub struct FileMarkerStore {
    dir: PathBuf,
}

impl FileMarkerStore {
    /// Opens (creating if necessary) the marker directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CreateDir`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: EntityId) -> PathBuf {
        self.dir.join(format!("{id}.txt"))
    }
}

impl MarkerStore for FileMarkerStore {
    fn get(&self, id: EntityId) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(id)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                entity: id.0,
                source,
            }),
        }
    }

    fn put(&self, id: EntityId, marker: &str) -> Result<(), StoreError> {
        std::fs::write(self.path_for(id), marker).map_err(|source| StoreError::Io {
            entity: id.0,
            source,
        })
    }

    fn delete(&self, id: EntityId) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                entity: id.0,
                source,
            }),
        }
    }

    fn list(&self) -> Result<Vec<EntityId>, StoreError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            entity: 0,
            source,
        })?;
        let mut ids = Vec::new();
        for entry in entries.filter_map(std::result::Result::ok) {
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".txt")) else {
                continue;
            };
            if let Ok(raw) = stem.parse::<u64>() {
                ids.push(EntityId(raw));
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

/// In-memory marker store for tests and hosts that embed their own
/// persistence. Not durable.
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    markers: Mutex<HashMap<EntityId, String>>,
}

impl MemoryMarkerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EntityId, String>> {
        // Marker strings cannot poison the lock in practice; recover anyway.
        self.markers.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn get(&self, id: EntityId) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(&id).cloned())
    }

    fn put(&self, id: EntityId, marker: &str) -> Result<(), StoreError> {
        self.lock().insert(id, marker.to_string());
        Ok(())
    }

    fn delete(&self, id: EntityId) -> Result<(), StoreError> {
        self.lock().remove(&id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<EntityId>, StoreError> {
        let mut ids: Vec<EntityId> = self.lock().keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMarkerStore::open(dir.path()).unwrap();

        assert_eq!(store.get(EntityId(1)).unwrap(), None);
        store.put(EntityId(1), "DEATH").unwrap();
        assert_eq!(store.get(EntityId(1)).unwrap().as_deref(), Some("DEATH"));
        store.delete(EntityId(1)).unwrap();
        assert_eq!(store.get(EntityId(1)).unwrap(), None);
    }

    #[test]
    fn test_file_store_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMarkerStore::open(dir.path()).unwrap();
        store.put(EntityId(1), "DEATH").unwrap();
        store.put(EntityId(1), "RESTORE:10").unwrap();
        assert_eq!(
            store.get(EntityId(1)).unwrap().as_deref(),
            Some("RESTORE:10")
        );
    }

    #[test]
    fn test_file_store_delete_absent_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMarkerStore::open(dir.path()).unwrap();
        store.delete(EntityId(99)).unwrap();
    }

    #[test]
    fn test_file_store_list_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMarkerStore::open(dir.path()).unwrap();
        store.put(EntityId(3), "DEATH").unwrap();
        store.put(EntityId(1), "DEATH").unwrap();
        std::fs::write(dir.path().join("README"), "not a marker").unwrap();
        std::fs::write(dir.path().join("abc.txt"), "bad name").unwrap();

        assert_eq!(store.list().unwrap(), vec![EntityId(1), EntityId(3)]);
    }

    #[test]
    fn test_file_store_open_creates_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileMarkerStore::open(&nested).unwrap();
        store.put(EntityId(1), "DEATH").unwrap();
        assert!(nested.join("1.txt").exists());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryMarkerStore::new();
        store.put(EntityId(2), "RESTORE:5").unwrap();
        assert_eq!(
            store.get(EntityId(2)).unwrap().as_deref(),
            Some("RESTORE:5")
        );
        assert_eq!(store.list().unwrap(), vec![EntityId(2)]);
        store.delete(EntityId(2)).unwrap();
        assert_eq!(store.get(EntityId(2)).unwrap(), None);
    }
}
