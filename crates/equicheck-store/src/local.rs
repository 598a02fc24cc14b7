//! Local key/value store with named slots.
//!
//! Each slot holds one string value that is always replaced wholesale.
//! Supports an in-memory mode (ephemeral) and a file-backed mode where every
//! slot is `<dir>/<slot>.json`. Use [`open`](LocalStore::open) for storage that
//! survives across process restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::StoreError;

enum Backing {
    Memory(Mutex<HashMap<String, String>>),
    Dir(PathBuf),
}

/// On-device slot store used for offline mode and as the remote fallback.
pub struct LocalStore {
    backing: Backing,
}

impl LocalStore {
    /// An ephemeral store that lives as long as the value.
    pub fn in_memory() -> Self {
        Self {
            backing: Backing::Memory(Mutex::new(HashMap::new())),
        }
    }

    /// A file-backed store rooted at `dir`.
    ///
    /// The directory is created on the first write, so opening never fails.
    pub fn open(dir: &Path) -> Self {
        Self {
            backing: Backing::Dir(dir.to_path_buf()),
        }
    }

    /// Root directory, if file-backed.
    pub fn dir(&self) -> Option<&Path> {
        match &self.backing {
            Backing::Dir(dir) => Some(dir),
            Backing::Memory(_) => None,
        }
    }

    /// Read a slot. `None` if the slot was never written or has been removed.
    pub async fn get(&self, slot: &str) -> Result<Option<String>, StoreError> {
        match &self.backing {
            Backing::Memory(map) => Ok(lock(map)?.get(slot).cloned()),
            Backing::Dir(dir) => match tokio::fs::read_to_string(slot_path(dir, slot)).await {
                Ok(s) => Ok(Some(s)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Overwrite a slot.
    ///
    /// File-backed writes go to a temporary sibling first and are renamed into
    /// place, so readers never observe a half-written slot.
    pub async fn set(&self, slot: &str, value: &str) -> Result<(), StoreError> {
        match &self.backing {
            Backing::Memory(map) => {
                lock(map)?.insert(slot.to_string(), value.to_string());
            }
            Backing::Dir(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                let path = slot_path(dir, slot);
                let tmp = path.with_extension("json.tmp");
                tokio::fs::write(&tmp, value).await?;
                tokio::fs::rename(&tmp, &path).await?;
                debug!(path = %path.display(), bytes = value.len(), "wrote local slot");
            }
        }
        Ok(())
    }

    /// Delete a slot. Returns whether anything was removed.
    pub async fn remove(&self, slot: &str) -> Result<bool, StoreError> {
        match &self.backing {
            Backing::Memory(map) => Ok(lock(map)?.remove(slot).is_some()),
            Backing::Dir(dir) => match tokio::fs::remove_file(slot_path(dir, slot)).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            },
        }
    }
}

fn slot_path(dir: &Path, slot: &str) -> PathBuf {
    dir.join(format!("{slot}.json"))
}

fn lock(
    map: &Mutex<HashMap<String, String>>,
) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
    map.lock()
        .map_err(|_| StoreError::PersistenceFailed("in-memory store lock poisoned".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_get_set_remove() {
        let store = LocalStore::in_memory();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "[1]").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("[1]"));

        store.set("k", "[2]").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("[2]"));

        assert!(store.remove("k").await.unwrap());
        assert!(!store.remove("k").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn open_does_not_create_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("equicheck");
        let store = LocalStore::open(&dir);
        assert!(!dir.exists());
        assert_eq!(store.get("slot").await.unwrap(), None);
        assert_eq!(store.dir(), Some(dir.as_path()));
    }

    #[tokio::test]
    async fn dir_write_creates_file_and_leaves_no_temp() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("data");
        let store = LocalStore::open(&dir);

        store.set("slot", "hello").await.unwrap();
        assert!(dir.join("slot.json").exists());
        assert!(!dir.join("slot.json.tmp").exists());
        assert_eq!(store.get("slot").await.unwrap().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn dir_survives_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        LocalStore::open(tmp.path()).set("slot", "kept").await.unwrap();

        let reopened = LocalStore::open(tmp.path());
        assert_eq!(reopened.get("slot").await.unwrap().as_deref(), Some("kept"));
        assert!(reopened.remove("slot").await.unwrap());
        assert!(!tmp.path().join("slot.json").exists());
    }

    #[tokio::test]
    async fn remove_missing_file_is_not_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = LocalStore::open(tmp.path());
        assert!(!store.remove("nothing").await.unwrap());
    }
}
