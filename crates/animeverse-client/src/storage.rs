//! Durable key/value persistence for client state.
//!
//! # Design
//! - Stores see one small trait; the backend decides where bytes live.
//! - `get` never fails: unreadable or malformed data is reported as absent.
//! - Writes are fallible so callers can log them; a failed write never
//!   aborts the operation that triggered it.
//! - [`FileStorage`] rewrites its JSON document through a sibling temp file
//!   and a rename so a crash cannot leave a half-written file behind.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::warn;

/// Key holding the signed-in user record and bearer token.
pub const SESSION_KEY: &str = "animeverse.session";
/// Key holding the identifier of the selected profile.
pub const ACTIVE_PROFILE_KEY: &str = "animeverse.profile.current";

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("failed to {operation} '{}'", .path.display())]
    Io {
        /// What was being attempted.
        operation: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The in-memory document could not be serialised.
    #[error("failed to encode client state")]
    Encode {
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// String key/value persistence shared by the stores.
pub trait KeyValueStore: Send + Sync {
    /// Current value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be made durable.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Delete `key`; deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the deletion cannot be made durable.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Process-local storage; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Storage persisted as a flat JSON object on disk.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the state file at `path`.
    ///
    /// A missing file starts empty. A file that is not a JSON object of
    /// strings is ignored with a warning and replaced on the next write.
    ///
    /// # Errors
    ///
    /// Returns an error only when an existing file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring malformed state file");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StorageError::Io {
                    operation: "read",
                    path,
                    source,
                });
            }
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let encoded =
            serde_json::to_vec_pretty(entries).map_err(|source| StorageError::Encode { source })?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                operation: "create directory for",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, encoded).map_err(|source| StorageError::Io {
            operation: "write",
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &self.path).map_err(|source| StorageError::Io {
            operation: "replace",
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}

pub(crate) fn persist_or_warn(storage: &dyn KeyValueStore, key: &str, value: &str) {
    if let Err(err) = storage.set(key, value) {
        warn!(key, error = %err, "failed to persist client state");
    }
}

pub(crate) fn remove_or_warn(storage: &dyn KeyValueStore, key: &str) {
    if let Err(err) = storage.remove(key) {
        warn!(key, error = %err, "failed to clear client state");
    }
}
