//! Durable key/value backends for client-local state.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store only needs string get/set/remove/clear. Native builds
//! persist to a JSON file, tests use the in-memory map, and the `browser`
//! feature maps the same calls onto `window.localStorage`.
//!
//! ERROR HANDLING
//! ==============
//! Reads never fail: an unreadable backend reads as empty. Writes surface
//! `ClientError::Storage` so callers can keep the token and user in step.

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ClientError;

/// String key/value storage with `localStorage` semantics.
pub trait KeyValueStore {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the backend rejects the write.
    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the backend rejects the write.
    fn remove(&mut self, key: &str) -> Result<(), ClientError>;

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the backend rejects the write.
    fn clear(&mut self) -> Result<(), ClientError>;
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-local store. Nothing survives the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ClientError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ClientError> {
        self.entries.clear();
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// JSON-file store. The whole map is rewritten on every mutation through a
/// sibling temp file and a rename, so a crash never leaves a torn file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing or unreadable file opens empty.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        Self { path, entries }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| storage_error(&self.path, &e))?;
        }
        let raw = serde_json::to_vec_pretty(&self.entries).map_err(|e| ClientError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, raw).map_err(|e| storage_error(&tmp, &e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| storage_error(&self.path, &e))
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, String> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "session file unreadable; starting empty");
            return BTreeMap::new();
        }
    };
    serde_json::from_slice(&raw).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "session file malformed; starting empty");
        BTreeMap::new()
    })
}

fn storage_error(path: &Path, error: &std::io::Error) -> ClientError {
    ClientError::Storage(format!("{}: {error}", path.display()))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        let previous = self.entries.insert(key.to_owned(), value.to_owned());
        if let Err(e) = self.flush() {
            match previous {
                Some(old) => self.entries.insert(key.to_owned(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ClientError> {
        let Some(old) = self.entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush() {
            self.entries.insert(key.to_owned(), old);
            return Err(e);
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ClientError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(storage_error(&self.path, &e)),
        }
        self.entries.clear();
        Ok(())
    }
}

// =============================================================================
// BROWSER
// =============================================================================

/// `window.localStorage`, available with the `browser` feature.
#[cfg(feature = "browser")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

#[cfg(feature = "browser")]
impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }

    fn storage_or_err() -> Result<web_sys::Storage, ClientError> {
        Self::storage().ok_or_else(|| ClientError::Storage("localStorage unavailable".to_owned()))
    }
}

#[cfg(feature = "browser")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        Self::storage_or_err()?
            .set_item(key, value)
            .map_err(|_| ClientError::Storage(format!("localStorage rejected write of `{key}`")))
    }

    fn remove(&mut self, key: &str) -> Result<(), ClientError> {
        Self::storage_or_err()?
            .remove_item(key)
            .map_err(|_| ClientError::Storage(format!("localStorage rejected removal of `{key}`")))
    }

    fn clear(&mut self) -> Result<(), ClientError> {
        Self::storage_or_err()?.clear().map_err(|_| ClientError::Storage("localStorage rejected clear".to_owned()))
    }
}
