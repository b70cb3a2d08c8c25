use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::StorageError;

/// Serialized `Identity` record.
pub const USER_KEY: &str = "user";
/// Raw bearer credential.
pub const TOKEN_KEY: &str = "access_token";
/// The identity's numeric id, stored separately for quick lookups.
pub const USER_ID_KEY: &str = "user_id";

/// Every key owned by the session; removed together.
pub const SESSION_KEYS: [&str; 3] = [USER_KEY, TOKEN_KEY, USER_ID_KEY];

// 1. ClientStorage Contract
/// ClientStorage
///
/// Durable string key/value storage that survives process restarts, the
/// client-side equivalent of browser local storage. The session store only
/// talks to this trait, so the file-backed store used in production can be
/// swapped for the in-memory one in tests.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Returns the stored value, or `None` when the key was never set.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a key that does not exist is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Removes several keys. Backends that can do this in one write override it.
    async fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove_item(key).await?;
        }
        Ok(())
    }
}

// 2. The Real Implementation (JSON file on disk)
/// FileStorage
///
/// Keeps every key in a single JSON object file. Each write rewrites the file
/// through a temporary sibling and a rename, so a crash mid-write leaves either
/// the old or the new contents, never a truncated file.
pub struct FileStorage {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    lock: tokio::sync::Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let body = serde_json::to_vec_pretty(map)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Loads the map for a mutation. A corrupt file is replaced rather than
    /// blocking every future write.
    async fn read_map_for_write(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.read_map().await {
            Err(StorageError::Corrupt(reason)) => {
                tracing::warn!(path = %self.path.display(), %reason, "Discarding corrupt session file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }
}

#[async_trait]
impl ClientStorage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        let map = self.read_map().await?;
        Ok(map.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map_for_write().await?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.remove_items(&[key]).await
    }

    async fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map_for_write().await?;
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        // Nothing to remove and no file yet: leave the disk untouched.
        if map.len() == before && !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }
        self.write_map(&map).await
    }
}

// 3. The Mock Implementation (For Tests)
/// MemoryStorage
///
/// In-process `ClientStorage` used by unit and integration tests. Clones share
/// the same map, which lets a test "reload" by building a fresh store over it.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Seeds a raw value, bypassing the failure switch.
    pub fn with_item(self, key: &str, value: &str) -> Self {
        if let Ok(mut items) = self.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Snapshot of a raw value, bypassing the failure switch.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items.lock().ok().and_then(|items| items.get(key).cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().map(|items| items.is_empty()).unwrap_or(true)
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Unavailable(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }
        Ok(())
    }

    fn poisoned() -> StorageError {
        StorageError::Unavailable("memory storage lock poisoned".to_string())
    }
}

#[async_trait]
impl ClientStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        let items = self.items.lock().map_err(|_| Self::poisoned())?;
        Ok(items.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        let mut items = self.items.lock().map_err(|_| Self::poisoned())?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        let mut items = self.items.lock().map_err(|_| Self::poisoned())?;
        items.remove(key);
        Ok(())
    }
}

/// StorageState
///
/// The shared handle to the durable storage backend.
pub type StorageState = Arc<dyn ClientStorage>;
