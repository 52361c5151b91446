// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Catalog orchestration.
//!
//! [`CatalogService`] owns the loaders, the published catalog and the
//! resolver. Every rebuild follows the same order: merge the latest
//! per-source lists (local edits, then remote, then fixtures), publish the
//! new catalog, and only then clear the resolution cache.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogState, Entity, EntityKind, KindHint, RawRecord, merge};
use crate::config::Config;
use crate::events::{CatalogEvent, EventBroadcaster, EventKind};
use crate::normalize;
use crate::resolve::{Resolution, Resolver, ResolverOptions};
use crate::sources::{FixtureSource, LocalSource, Origin, RemoteSource, Source, SourceError};
use crate::store::{FileStore, KeyValueStore};

/// Most recent successful load of each source.
#[derive(Debug, Default)]
struct LoadedSources {
    fixtures: Vec<Entity>,
    remote: Vec<Entity>,
    local: BTreeMap<EntityKind, Vec<Entity>>,
}

impl LoadedSources {
    /// Source lists in priority order, highest first.
    fn prioritized(&self) -> Vec<Vec<Entity>> {
        let local: Vec<Entity> = EntityKind::AUTHORED
            .iter()
            .filter_map(|kind| self.local.get(kind))
            .flatten()
            .cloned()
            .collect();
        vec![local, self.remote.clone(), self.fixtures.clone()]
    }
}

/// The catalog resolution service.
pub struct CatalogService {
    fixtures: FixtureSource,
    remote: Option<RemoteSource>,
    local: LocalSource,
    state: CatalogState,
    resolver: Resolver,
    events: EventBroadcaster,
    loaded: Mutex<LoadedSources>,
}

impl CatalogService {
    /// Creates a service over the given sources. Nothing is loaded until
    /// [`CatalogService::load`] is called.
    #[must_use]
    pub fn new(
        fixtures: FixtureSource,
        remote: Option<RemoteSource>,
        local: LocalSource,
        options: ResolverOptions,
    ) -> Self {
        Self {
            fixtures,
            remote,
            local,
            state: CatalogState::new(),
            resolver: Resolver::new(options),
            events: EventBroadcaster::new(),
            loaded: Mutex::new(LoadedSources::default()),
        }
    }

    /// Replaces the event publisher (builder style).
    #[must_use]
    pub fn with_events(mut self, events: EventBroadcaster) -> Self {
        self.events = events;
        self
    }

    /// Builds a service from configuration: bundled fixtures, a file store
    /// under the data directory and, unless `offline`, the remote API.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory, the remote client or the
    /// event log cannot be set up.
    pub fn from_config(config: &Config, offline: bool) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.data_dir())?);
        let local = LocalSource::new(store, config.environment);

        let remote = match (&config.remote.base_url, offline) {
            (Some(base_url), false) => Some(RemoteSource::new(
                base_url,
                config.remote.limit,
                config.remote.timeout(),
            )?),
            _ => None,
        };

        let events = match &config.events_log {
            Some(path) => EventBroadcaster::with_log(path)?,
            None => EventBroadcaster::new(),
        };

        Ok(Self::new(
            FixtureSource::bundled(),
            remote,
            local,
            config.synthesis.resolver_options(),
        )
        .with_events(events))
    }

    /// Loads every source, then merges and publishes.
    ///
    /// Source failures are logged and reported as events; the affected
    /// source contributes nothing and the merge goes ahead without it.
    pub async fn load(&self) -> Arc<Catalog> {
        let fixtures = match self.fixtures.load().await {
            Ok(entities) => entities,
            Err(e) => {
                self.source_failed(&e, Origin::Fixtures);
                Vec::new()
            }
        };
        let remote = self.fetch_remote().await;
        let local: BTreeMap<EntityKind, Vec<Entity>> = EntityKind::AUTHORED
            .into_iter()
            .map(|kind| (kind, self.read_local(kind)))
            .collect();

        {
            let mut loaded = self.lock_loaded();
            loaded.fixtures = fixtures;
            loaded.remote = remote.unwrap_or_default();
            loaded.local = local;
        }
        self.rebuild()
    }

    /// Re-fetches the remote source and re-merges.
    ///
    /// Returns `false` (and keeps the previously fetched remote records) when
    /// no remote is configured or the fetch fails.
    pub async fn refresh_remote(&self) -> bool {
        let Some(remote) = self.fetch_remote().await else {
            return false;
        };
        self.lock_loaded().remote = remote;
        self.rebuild();
        true
    }

    /// Re-reads local edits of one kind, then re-merges, publishes and clears
    /// the resolution cache.
    pub fn notify_entity_changed(&self, kind: EntityKind) -> Arc<Catalog> {
        info!("Local {kind} records changed");
        self.events.send(EventKind::EntityChanged { kind });

        if EntityKind::AUTHORED.contains(&kind) {
            let entities = self.read_local(kind);
            self.lock_loaded().local.insert(kind, entities);
        }
        self.rebuild()
    }

    /// Resolves an untrusted key to exactly one entity.
    pub fn resolve(&self, raw_key: &str, hint: KindHint) -> Resolution {
        let resolution = self.resolver.resolve(&self.state, raw_key, hint);
        if resolution.is_synthesized() && !resolution.cached {
            self.events.send(EventKind::Synthesized {
                key: raw_key.to_string(),
                id: resolution.entity.id.clone(),
            });
        }
        resolution
    }

    /// Inserts or replaces a locally edited record, then re-merges.
    ///
    /// An existing record of the same kind and normalized id is replaced in
    /// place; otherwise the record is appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the record has no usable id or name, or if the
    /// store write fails.
    pub fn upsert_local(&self, record: RawRecord, kind: EntityKind) -> Result<Entity> {
        if !EntityKind::AUTHORED.contains(&kind) {
            anyhow::bail!("{kind} entities are derived and cannot be edited");
        }
        let entity = record
            .into_entity(kind)
            .context("Invalid record")?;

        let mut entities = self.local.load_kind(kind);
        let key = entity.normalized_id();
        match entities.iter_mut().find(|e| e.normalized_id() == key) {
            Some(existing) => *existing = entity.clone(),
            None => entities.push(entity.clone()),
        }
        self.local.save_kind(kind, &entities)?;

        info!("Saved local {kind} {}", entity.id);
        self.notify_entity_changed(kind);
        Ok(entity)
    }

    /// Removes a locally edited record, then re-merges.
    ///
    /// Returns `false` without touching the store when no local record of
    /// that kind has the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn delete_local(&self, kind: EntityKind, id: &str) -> Result<bool> {
        let key = normalize::normalize(id, false);
        let mut entities = self.local.load_kind(kind);
        let before = entities.len();
        entities.retain(|e| e.normalized_id() != key);
        if entities.len() == before {
            return Ok(false);
        }
        self.local.save_kind(kind, &entities)?;

        info!("Deleted local {kind} {id}");
        self.notify_entity_changed(kind);
        Ok(true)
    }

    /// The currently published catalog.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.state.snapshot()
    }

    /// Authored entities, optionally restricted to one kind.
    #[must_use]
    pub fn list(&self, kind: Option<EntityKind>) -> Vec<Entity> {
        self.snapshot()
            .authored()
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .cloned()
            .collect()
    }

    /// Derived category entities, in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<Entity> {
        self.snapshot().categories().cloned().collect()
    }

    /// Authored entities filed under a category slug.
    #[must_use]
    pub fn entities_in_category(&self, slug: &str) -> Vec<Entity> {
        self.snapshot().in_category(slug).cloned().collect()
    }

    /// Number of memoized resolutions.
    #[must_use]
    pub fn cached_resolutions(&self) -> usize {
        self.resolver.cache().len()
    }

    /// Subscribes to catalog events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    /// Merges the loaded lists, publishes the result, then clears the cache.
    fn rebuild(&self) -> Arc<Catalog> {
        let sources = self.lock_loaded().prioritized();
        let catalog = merge(sources);
        let entities = catalog.authored().count();
        let categories = catalog.categories().count();

        self.state.replace(catalog);
        info!("Published catalog: {entities} entities, {categories} categories");
        self.events.send(EventKind::CatalogUpdated {
            entities,
            categories,
        });

        let entries = self.resolver.invalidate();
        self.events.send(EventKind::CacheInvalidated { entries });

        self.state.snapshot()
    }

    async fn fetch_remote(&self) -> Option<Vec<Entity>> {
        let remote = self.remote.as_ref()?;
        match remote.load().await {
            Ok(entities) => {
                info!("Loaded {} remote records", entities.len());
                Some(entities)
            }
            Err(e) => {
                self.source_failed(&e, Origin::Remote);
                None
            }
        }
    }

    fn read_local(&self, kind: EntityKind) -> Vec<Entity> {
        self.local.try_load_kind(kind).unwrap_or_else(|e| {
            self.source_failed(&e, self.local.origin());
            Vec::new()
        })
    }

    fn source_failed(&self, error: &SourceError, origin: Origin) {
        warn!("Skipping {origin} source: {error}");
        self.events.send(EventKind::SourceFailed {
            origin: origin.to_string(),
            reason: error.to_string(),
        });
    }

    fn lock_loaded(&self) -> MutexGuard<'_, LoadedSources> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
