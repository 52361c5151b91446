// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! The unified catalog and its process-wide holder.
//!
//! [`CatalogState`] owns the current [`Catalog`] behind an `Arc`. Writers
//! build a complete new catalog and swap it in; readers clone the `Arc` and
//! keep seeing the catalog they started with, so a half-built catalog is
//! never observable.
//!
//! Every replace bumps the catalog's generation. Resolver placeholders are
//! only retained into the generation they were computed against.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

use crate::catalog::{Entity, EntityKind};
use crate::normalize;

/// An ordered, immutable snapshot of merged entities plus derived categories.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    entities: Vec<Entity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    built_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    generation: u64,
}

impl Catalog {
    /// Creates a catalog from already-merged entities.
    #[must_use]
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            built_at: Some(Utc::now()),
            generation: 0,
        }
    }

    /// All entities in catalog order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Server, client and agent entities (everything except categories).
    pub fn authored(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| !e.is_category())
    }

    /// Entities of a single kind.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    /// Derived category entities.
    pub fn categories(&self) -> impl Iterator<Item = &Entity> {
        self.of_kind(EntityKind::Category)
    }

    /// Looks up a derived category by slug (the slug is normalized first).
    #[must_use]
    pub fn category(&self, slug: &str) -> Option<&Entity> {
        let slug = normalize::category_slug(slug);
        self.categories().find(|e| e.id == slug)
    }

    /// Authored entities whose category collapses to `slug`.
    pub fn in_category(&self, slug: &str) -> impl Iterator<Item = &Entity> {
        let slug = normalize::category_slug(slug);
        self.authored()
            .filter(move |e| e.category_slug.as_deref() == Some(slug.as_str()))
    }

    /// Finds an entity by kind and id, comparing normalized ids.
    #[must_use]
    pub fn find(&self, kind: EntityKind, id: &str) -> Option<&Entity> {
        let wanted = normalize::normalize(id, false);
        if wanted.is_empty() {
            return self.of_kind(kind).find(|e| e.id == id);
        }
        self.of_kind(kind).find(|e| e.normalized_id() == wanted)
    }

    /// Number of resolver placeholders currently held.
    #[must_use]
    pub fn synthesized_count(&self) -> usize {
        self.entities.iter().filter(|e| e.synthesized).count()
    }

    /// When the catalog was built, if it came from a merge.
    #[must_use]
    pub const fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    /// How many times the owning [`CatalogState`] has been replaced when
    /// this catalog was published. Retaining a placeholder keeps it.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of entities, categories included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the catalog holds no entities at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Copy of this catalog with `entity` added ahead of the categories.
    ///
    /// When `max_retained` placeholders are already present the oldest one
    /// is evicted first.
    fn with_synthesized(&self, entity: Entity, max_retained: usize) -> Self {
        let mut entities = self.entities.clone();

        if entities.iter().filter(|e| e.synthesized).count() >= max_retained
            && let Some(oldest) = entities.iter().position(|e| e.synthesized)
        {
            entities.remove(oldest);
        }

        let at = entities
            .iter()
            .position(Entity::is_category)
            .unwrap_or(entities.len());
        entities.insert(at, entity);

        Self {
            entities,
            built_at: self.built_at,
            generation: self.generation,
        }
    }
}

/// Owner of the current catalog snapshot.
#[derive(Debug, Default)]
pub struct CatalogState {
    current: RwLock<Arc<Catalog>>,
}

impl CatalogState {
    /// Creates a state holding an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current catalog. The snapshot stays valid after a replace.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in a freshly merged catalog under the next generation and
    /// returns the previous one.
    pub fn replace(&self, mut catalog: Catalog) -> Arc<Catalog> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        catalog.generation = current.generation + 1;
        std::mem::replace(&mut *current, Arc::new(catalog))
    }

    /// Adds a resolver placeholder to the current catalog.
    ///
    /// Returns `false` if nothing was added: `max_retained` is zero, the
    /// catalog is no longer at `generation`, or an entity with the same kind
    /// and id is already present.
    pub fn retain_synthesized(&self, entity: Entity, max_retained: usize, generation: u64) -> bool {
        if max_retained == 0 {
            return false;
        }

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if current.generation != generation
            || current.of_kind(entity.kind).any(|e| e.id == entity.id)
        {
            return false;
        }

        let next = current.with_synthesized(entity, max_retained);
        *current = Arc::new(next);
        true
    }
}
