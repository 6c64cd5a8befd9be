//! Persisted session state.
//!
//! Cart, wishlist and compare are stored under independent keys as JSON, so a
//! corrupt or missing entry for one never affects the others.
//!
//! | Key | Shape |
//! |---|---|
//! | `cart` | `[{"productId": "...", "quantity": 2}]` |
//! | `wishlist` | `["id", ...]` |
//! | `compare` | `["id", ...]` |

use core::fmt;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use solarmart_core::ProductId;

use crate::config::StorefrontConfig;

/// Errors reading or writing persisted session state.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode session state: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backend refused the operation (quota, disabled, read-only).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// One independently persisted piece of session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Cart,
    Wishlist,
    Compare,
}

impl StorageKey {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
            Self::Compare => "compare",
        }
    }

    /// File name used by [`FileStorage`].
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value backend for persisted session state.
///
/// Values are opaque JSON documents. Implementations must be usable from any
/// thread.
pub trait SessionStorage: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load(&self, key: StorageKey) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn store(&self, key: StorageKey, value: &str) -> Result<(), StorageError>;
}

// =============================================================================
// Backends
// =============================================================================

/// Process-local storage; state lasts as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(&key).cloned())
    }

    fn store(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_owned());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` for session files, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl SessionStorage for FileStorage {
    fn load(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        std::fs::write(self.path(key), value)?;
        Ok(())
    }
}

/// Pick the backend for a configuration: files when a session directory is
/// set, memory otherwise.
///
/// # Errors
///
/// Returns an error if the session directory cannot be created.
pub fn storage_from_config(
    config: &StorefrontConfig,
) -> Result<Arc<dyn SessionStorage>, StorageError> {
    match &config.session_dir {
        Some(dir) => Ok(Arc::new(FileStorage::open(dir)?)),
        None => Ok(Arc::new(MemoryStorage::new())),
    }
}

// =============================================================================
// Persisted Shapes
// =============================================================================

/// A cart line as persisted: the product is stored by ID only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCartLine {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Everything read back at session start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSession {
    pub cart: Vec<PersistedCartLine>,
    pub wishlist: Vec<ProductId>,
    pub compare: Vec<ProductId>,
}

impl PersistedSession {
    /// Distinct product IDs across all three keys, in first-seen order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::new();
        let all = self
            .cart
            .iter()
            .map(|line| &line.product_id)
            .chain(&self.wishlist)
            .chain(&self.compare);
        for id in all {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }
}

/// Read every key. A key that is missing, unreadable or malformed loads as
/// empty; the failure is logged.
#[must_use]
pub fn load_snapshot(storage: &dyn SessionStorage) -> PersistedSession {
    PersistedSession {
        cart: load_key(storage, StorageKey::Cart),
        wishlist: load_key(storage, StorageKey::Wishlist),
        compare: load_key(storage, StorageKey::Compare),
    }
}

fn load_key<T: DeserializeOwned>(storage: &dyn SessionStorage, key: StorageKey) -> Vec<T> {
    let json = match storage.load(key) {
        Ok(Some(json)) => json,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to read persisted session state");
            return Vec::new();
        }
    };

    serde_json::from_str(&json).unwrap_or_else(|e| {
        warn!(key = %key, error = %e, "Discarding malformed persisted session state");
        Vec::new()
    })
}

/// Serialize and write one key.
pub(crate) fn store_key<T: Serialize>(
    storage: &dyn SessionStorage,
    key: StorageKey,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    storage.store(key, &json)
}
