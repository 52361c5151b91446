// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Locally persisted catalog edits.
//!
//! Admin edits are stored as one JSON array per entity kind, under the
//! namespace of the active [`Environment`]. Missing or corrupt data reads as
//! an empty list so that a bad edit can never take the catalog down.

use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::{Entity, EntityKind, RawRecord};
use crate::sources::{Origin, SourceError};
use crate::store::{Environment, KeyValueStore};

/// Loader and writer for locally edited records.
#[derive(Clone)]
pub struct LocalSource {
    store: Arc<dyn KeyValueStore>,
    environment: Environment,
}

impl LocalSource {
    /// Creates a loader over `store` for the given environment.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, environment: Environment) -> Self {
        Self { store, environment }
    }

    /// Identifies this loader's namespace for logs and events.
    #[must_use]
    pub const fn origin(&self) -> Origin {
        Origin::Local(self.environment)
    }

    /// Reads and validates the stored records of one kind.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Store`] if the store cannot be read and
    /// [`SourceError::CorruptLocalData`] if the stored value is not a JSON
    /// array. Individual invalid records are dropped with a warning.
    pub fn try_load_kind(&self, kind: EntityKind) -> Result<Vec<Entity>, SourceError> {
        let namespace = self.environment.namespace();
        let key = kind.storage_key();

        let Some(json) = self
            .store
            .get(namespace, key)
            .map_err(|e| SourceError::Store(format!("{e:#}")))?
        else {
            return Ok(Vec::new());
        };

        let values: Vec<Value> =
            serde_json::from_str(&json).map_err(|source| SourceError::CorruptLocalData {
                namespace: namespace.to_string(),
                key: key.to_string(),
                source,
            })?;

        let mut entities = Vec::with_capacity(values.len());
        for value in values {
            let record = serde_json::from_value::<RawRecord>(value)
                .map_err(|e| SourceError::InvalidRecord(e.to_string()))
                .and_then(|record| record.into_entity(kind));
            match record {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!("Skipping stored {kind} record in {namespace}: {e}"),
            }
        }
        Ok(entities)
    }

    /// Reads one kind, treating every failure as an empty list.
    #[must_use]
    pub fn load_kind(&self, kind: EntityKind) -> Vec<Entity> {
        match self.try_load_kind(kind) {
            Ok(entities) => {
                debug!(
                    "Loaded {} local {kind} records from {}",
                    entities.len(),
                    self.environment
                );
                entities
            }
            Err(e) => {
                warn!("Ignoring local {kind} records: {e}");
                Vec::new()
            }
        }
    }

    /// Replaces the stored list for one kind.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    pub fn save_kind(&self, kind: EntityKind, entities: &[Entity]) -> Result<()> {
        let json = serde_json::to_string_pretty(entities)
            .with_context(|| format!("Failed to serialize local {kind} records"))?;
        self.store
            .set(self.environment.namespace(), kind.storage_key(), &json)
            .with_context(|| format!("Failed to save local {kind} records"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use anyhow::Result;

    fn source_with(store: &Arc<MemoryStore>, env: Environment) -> LocalSource {
        LocalSource::new(store.clone(), env)
    }

    #[test]
    fn test_absent_storage_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let local = source_with(&store, Environment::Production);
        assert!(local.load_kind(EntityKind::Client).is_empty());
    }

    #[test]
    fn test_records_are_tagged_with_kind() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        store.set(
            "production",
            "clients",
            r#"[{"id": "cursor", "name": "Cursor", "kind": "server"}]"#,
        )?;
        let local = source_with(&store, Environment::Production);

        let clients = local.load_kind(EntityKind::Client);
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].kind, EntityKind::Client);
        assert_eq!(clients[0].id, "client-cursor");
        Ok(())
    }

    #[test]
    fn test_corrupt_storage_is_empty() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        store.set("production", "agents", "{ definitely not an array")?;
        let local = source_with(&store, Environment::Production);

        assert!(matches!(
            local.try_load_kind(EntityKind::Agent),
            Err(SourceError::CorruptLocalData { .. })
        ));
        assert!(local.load_kind(EntityKind::Agent).is_empty());
        Ok(())
    }

    #[test]
    fn test_environments_are_isolated() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let dev = source_with(&store, Environment::Development);
        dev.save_kind(EntityKind::Server, &[Entity::new("x", EntityKind::Server, "X")])?;

        let prod = source_with(&store, Environment::Production);
        assert!(prod.load_kind(EntityKind::Server).is_empty());
        assert_eq!(dev.load_kind(EntityKind::Server).len(), 1);
        Ok(())
    }

    #[test]
    fn test_kinds_are_stored_separately() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let local = source_with(&store, Environment::Production);
        local.save_kind(EntityKind::Server, &[Entity::new("s", EntityKind::Server, "S")])?;
        local.save_kind(EntityKind::Agent, &[Entity::new("a", EntityKind::Agent, "A")])?;

        assert_eq!(local.load_kind(EntityKind::Server).len(), 1);
        assert_eq!(local.load_kind(EntityKind::Agent).len(), 1);
        assert!(local.load_kind(EntityKind::Client).is_empty());
        assert_eq!(local.origin().to_string(), "local:production");
        Ok(())
    }
}
