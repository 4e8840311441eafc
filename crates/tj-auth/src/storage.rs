//! Key/value client storage shared by every tab of one viewer.
//!
//! [`SharedStorage`] models the browser origin's storage: one map, many tab
//! handles, and a change feed that every *other* tab observes. [`FileStorage`]
//! persists the same map as a JSON file for the CLI; it has no change feed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::error::AuthError;

const CHANGE_CAPACITY: usize = 64;

static NEXT_TAB: AtomicU64 = AtomicU64::new(1);

/// Identifies the tab that issued a storage write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(u64);

impl TabId {
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_TAB.fetch_add(1, Ordering::Relaxed))
    }
}

/// A key written or removed by `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub origin: TabId,
}

/// Change feed of a storage backend as seen from one tab.
///
/// Only changes made by other tabs are delivered.
pub struct StorageWatch {
    origin: TabId,
    rx: broadcast::Receiver<StorageEvent>,
}

impl StorageWatch {
    /// Next change made by another tab; `None` once the backend is gone.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.origin == self.origin => {}
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "storage watcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.origin == self.origin => {}
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }
}

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), AuthError>;

    /// Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the removal cannot be persisted.
    fn remove(&self, key: &str) -> Result<(), AuthError>;

    fn keys(&self) -> Vec<String>;

    /// Changes made by other tabs, if the backend can observe them.
    fn watch(&self) -> Option<StorageWatch> {
        None
    }
}

struct Shared {
    map: Mutex<BTreeMap<String, String>>,
    changes: broadcast::Sender<StorageEvent>,
}

/// In-process storage shared between tabs.
#[derive(Clone)]
pub struct SharedStorage {
    inner: Arc<Shared>,
}

impl Default for SharedStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStorage {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Arc::new(Shared {
                map: Mutex::new(BTreeMap::new()),
                changes,
            }),
        }
    }

    /// A handle for a new tab.
    #[must_use]
    pub fn open_tab(&self) -> TabStorage {
        TabStorage {
            shared: self.clone(),
            origin: TabId::next(),
        }
    }

    fn map(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.inner.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn announce(&self, key: &str, origin: TabId) {
        // No receivers is fine: nobody else is watching.
        let _ = self.inner.changes.send(StorageEvent {
            key: key.to_owned(),
            origin,
        });
    }
}

/// One tab's view of a [`SharedStorage`].
#[derive(Clone)]
pub struct TabStorage {
    shared: SharedStorage,
    origin: TabId,
}

impl TabStorage {
    #[must_use]
    pub const fn tab_id(&self) -> TabId {
        self.origin
    }
}

impl Storage for TabStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.shared.map().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let previous = self.shared.map().insert(key.to_owned(), value.to_owned());
        if previous.as_deref() != Some(value) {
            self.shared.announce(key, self.origin);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        let previous = self.shared.map().remove(key);
        if previous.is_some() {
            self.shared.announce(key, self.origin);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.shared.map().keys().cloned().collect()
    }

    fn watch(&self) -> Option<StorageWatch> {
        Some(StorageWatch {
            origin: self.origin,
            rx: self.shared.inner.changes.subscribe(),
        })
    }
}

/// Client storage persisted as a JSON object on disk.
///
/// The file is re-read on every access so separate processes see each
/// other's writes. Directory `0700`, file `0600` on Unix.
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> BTreeMap<String, String> {
        let Ok(body) = fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        if body.trim().is_empty() {
            return BTreeMap::new();
        }
        serde_json::from_str(&body).unwrap_or_else(|error| {
            tracing::warn!(%error, path = %self.path.display(), "ignoring unreadable client storage");
            BTreeMap::new()
        })
    }

    fn write(&self, map: &BTreeMap<String, String>) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AuthError::Storage(format!("mkdir {}: {e}", parent.display())))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }

        let body = serde_json::to_string_pretty(map)
            .map_err(|e| AuthError::Storage(format!("encode client storage: {e}")))?;
        fs::write(&self.path, body)
            .map_err(|e| AuthError::Storage(format!("write {}: {e}", self.path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| AuthError::Storage(format!("chmod {}: {e}", self.path.display())))?;
        }
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<(), AuthError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read();
        if apply(&mut map) {
            self.write(&map)?;
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.read().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.update(|map| map.insert(key.to_owned(), value.to_owned()).as_deref() != Some(value))
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.update(|map| map.remove(key).is_some())
    }

    fn keys(&self) -> Vec<String> {
        self.read().into_keys().collect()
    }
}
