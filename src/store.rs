// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Key-value persistence for locally edited catalog records.
//!
//! Values are JSON strings stored under a `(namespace, key)` pair. The
//! namespace is the deployment [`Environment`]; keys are fixed per entity
//! kind. [`MemoryStore`] backs tests, [`FileStore`] keeps one JSON file per
//! key under a data directory.

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Deployment namespace for locally persisted edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Live catalog edits.
    #[default]
    Production,
    /// Scratch edits that never reach production.
    Development,
}

impl Environment {
    /// Namespace string used with a [`KeyValueStore`].
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

/// Namespaced string storage.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value under `namespace/key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `namespace/key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()>;
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<(String, String), String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}

/// File-backed store: `<root>/<namespace>/<key>.json`.
///
/// Writes go to a temp file that is renamed over the target, so a reader
/// never sees a partially written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create data directory {}", root.display()))?;
        Ok(Self { root })
    }

    fn path_for(&self, namespace: &str, key: &str) -> Result<PathBuf> {
        check_segment(namespace)?;
        check_segment(key)?;
        Ok(self.root.join(namespace).join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let path = self.path_for(namespace, key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow!("Failed to read {}: {e}", path.display())),
        }
    }

    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(namespace, key)?;
        let dir = self.root.join(namespace);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let tmp = dir.join(format!(".{key}.{}.tmp", std::process::id()));
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            anyhow!("Failed to replace {}: {e}", path.display())
        })
    }
}

/// Namespaces and keys become path segments; keep them to `[a-z0-9_-]`.
fn check_segment(segment: &str) -> Result<()> {
    let valid = !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    if !valid {
        bail!("Invalid storage segment {segment:?}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("production", "servers").unwrap(), None);

        store.set("production", "servers", "[]").unwrap();
        assert_eq!(
            store.get("production", "servers").unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(store.get("development", "servers").unwrap(), None);
    }

    #[test]
    fn file_store_namespaces_are_separate() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data")).unwrap();

        store.set("production", "clients", "[1]").unwrap();
        store.set("development", "clients", "[2]").unwrap();

        assert_eq!(store.get("production", "clients").unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.get("development", "clients").unwrap().as_deref(), Some("[2]"));
        assert!(dir.path().join("data/production/clients.json").exists());
    }

    #[test]
    fn file_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.set("production", "agents", "old").unwrap();
        store.set("production", "agents", "new").unwrap();
        assert_eq!(store.get("production", "agents").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn file_store_rejects_path_segments() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert!(store.set("../escape", "servers", "[]").is_err());
        assert!(store.get("production", "a/b").is_err());
        assert!(store.get("production", "").is_err());
    }
}
