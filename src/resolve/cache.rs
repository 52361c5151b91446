// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Memoized resolver outcomes.
//!
//! Entries live until the next catalog rebuild, which clears the whole
//! cache. There is no TTL and no per-entry eviction. Each entry is tagged
//! with the catalog generation it was computed against and is only served
//! to lookups against that same generation.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::catalog::KindHint;
use crate::resolve::Resolution;

/// Cache key: the kind hint plus the normalized lookup key.
///
/// The hint is part of the key because the same slug can legitimately
/// resolve to different entities under different routes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Kind hint of the lookup.
    pub hint: KindHint,
    /// Normalized lookup key.
    pub key: String,
}

impl CacheKey {
    /// Builds a key from a hint and an already-normalized lookup key.
    pub fn new(hint: KindHint, normalized: impl Into<String>) -> Self {
        Self {
            hint,
            key: normalized.into(),
        }
    }
}

/// Map of resolved lookups, including synthesized (negative) outcomes.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<CacheKey, (u64, Resolution)>>,
}

impl ResolutionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the resolution cached for `key` against catalog
    /// `generation`, if any.
    #[must_use]
    pub fn get(&self, key: &CacheKey, generation: u64) -> Option<Resolution> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .filter(|(tag, _)| *tag == generation)
            .map(|(_, resolution)| resolution.clone())
    }

    /// Stores a resolution computed against catalog `generation`, replacing
    /// any previous one for the key.
    pub fn put(&self, key: CacheKey, generation: u64, resolution: Resolution) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, (generation, resolution));
    }

    /// Drops every entry and returns how many there were.
    pub fn invalidate_all(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let count = entries.len();
        entries.clear();
        count
    }

    /// Number of cached lookups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Entity, EntityKind};
    use crate::resolve::Strategy;

    fn resolution(id: &str) -> Resolution {
        Resolution {
            entity: Entity::new(id, EntityKind::Server, id),
            strategy: Strategy::ExactId,
            cached: false,
        }
    }

    #[test]
    fn test_put_get_invalidate() {
        let cache = ResolutionCache::new();
        let key = CacheKey::new(KindHint::Server, "github");
        assert!(cache.get(&key, 1).is_none());

        cache.put(key.clone(), 1, resolution("github"));
        assert_eq!(cache.get(&key, 1).map(|r| r.entity.id), Some("github".to_string()));
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.invalidate_all(), 1);
        assert!(cache.is_empty());
        assert!(cache.get(&key, 1).is_none());
    }

    #[test]
    fn test_entries_from_another_generation_are_not_served() {
        let cache = ResolutionCache::new();
        let key = CacheKey::new(KindHint::Server, "github");

        // Written late by a lookup that started before a rebuild.
        cache.put(key.clone(), 3, resolution("github"));
        assert!(cache.get(&key, 4).is_none());
        assert!(cache.get(&key, 3).is_some());
    }

    #[test]
    fn test_hint_is_part_of_the_key() {
        let cache = ResolutionCache::new();
        cache.put(CacheKey::new(KindHint::Server, "cursor"), 0, resolution("cursor"));
        assert!(cache.get(&CacheKey::new(KindHint::Client, "cursor"), 0).is_none());
    }
}
