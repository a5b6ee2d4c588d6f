//! Durable local key-value storage
//!
//! - `FileStore`: JSON object file on disk, used by the binary
//! - `MemoryStore`: process-local map, used by tests and embedders
//! - `ProgressStore`: per-film resume offsets on top of either

pub mod progress;

pub use progress::ProgressStore;

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// File name of the durable store inside the data directory
pub const STORE_FILE: &str = "store.json";

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Simple string-keyed store of JSON values.
///
/// Reads never fail; a key that is missing or unreadable is simply absent.
/// Writes report failures so callers can decide whether they matter.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored, in sorted order
    fn keys(&self) -> Vec<String>;

    /// Read a string value
    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read a numeric value (strings holding a number are accepted too)
    fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Volatile store backed by a map
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// Store persisted as a single JSON object file.
///
/// The whole map is kept in memory and the file is rewritten on every
/// mutation (temp file + rename, so a crash never leaves half a file).
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => {
                let map: Map<String, Value> = serde_json::from_str(&contents)?;
                map.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Default data directory (~/.local/share/embertv on Linux)
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("embertv"))
    }

    /// Default store location (~/.local/share/embertv/store.json on Linux)
    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn flush(&self, entries: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), value);
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.lock();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}
