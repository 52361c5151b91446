// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Entity resolution.
//!
//! Turns an untrusted route segment into exactly one entity. The cascade:
//!
//! 1. cache hit
//! 2. exact id, 3. name as slug, 4. normalized name, 5. prefix
//!    (see [`strategy::NAME_CASCADE`])
//! 6. historical client alias
//! 7. client filed under another kind
//! 8. partial word
//! 9. synthesized placeholder
//!
//! The first step that succeeds wins. A known alias counts as a success even
//! when no entity carries its canonical name: the caller gets a placeholder
//! under that name.
//!
//! Resolution never fails. When nothing matches, the caller gets a
//! placeholder flagged `synthesized` and can render a soft "not found" page.

/// Historical client slug table.
pub mod alias;
/// Memoized resolver outcomes.
pub mod cache;
/// Individual matching strategies.
pub mod strategy;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, CatalogState, Entity, EntityKind, KindHint};
use crate::normalize::{self, CLIENT_PREFIX};

pub use cache::{CacheKey, ResolutionCache};
pub use strategy::{LookupKey, Strategy};

/// Id given to placeholders for keys that are blank.
const BLANK_KEY_ID: &str = "unknown";

/// What to do with synthesized placeholders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisPolicy {
    /// Add placeholders to the in-memory catalog so list views and repeat
    /// lookups see them until the next rebuild.
    #[default]
    Retain,
    /// Return placeholders to the caller only.
    Discard,
}

/// Resolver tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Placeholder retention policy.
    pub policy: SynthesisPolicy,
    /// Upper bound on retained placeholders; the oldest is evicted first.
    pub max_retained: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            policy: SynthesisPolicy::Retain,
            max_retained: 256,
        }
    }
}

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// The resolved (or synthesized) entity.
    pub entity: Entity,
    /// Which cascade step produced it.
    pub strategy: Strategy,
    /// Whether it was served from the cache.
    pub cached: bool,
}

impl Resolution {
    /// Whether the entity is a placeholder rather than a catalog entry.
    #[must_use]
    pub const fn is_synthesized(&self) -> bool {
        self.entity.synthesized
    }
}

/// Resolves lookup keys against a [`CatalogState`], memoizing outcomes.
#[derive(Debug, Default)]
pub struct Resolver {
    cache: ResolutionCache,
    options: ResolverOptions,
}

impl Resolver {
    /// Creates a resolver with an empty cache.
    #[must_use]
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            cache: ResolutionCache::new(),
            options,
        }
    }

    /// The resolver's cache.
    #[must_use]
    pub const fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// The resolver's options.
    #[must_use]
    pub const fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Clears every memoized outcome. Call after the catalog is replaced.
    pub fn invalidate(&self) -> usize {
        self.cache.invalidate_all()
    }

    /// Resolves `raw_key` to a single entity. Never fails.
    pub fn resolve(&self, state: &CatalogState, raw_key: &str, hint: KindHint) -> Resolution {
        let key = LookupKey::new(raw_key);
        // Keys with no word characters all normalize to "" and must not share an entry.
        let cache_key = (!key.normalized.is_empty())
            .then(|| CacheKey::new(hint, key.normalized.clone()));

        let catalog = state.snapshot();
        let generation = catalog.generation();

        if let Some(hit) = cache_key
            .as_ref()
            .and_then(|k| self.cache.get(k, generation))
        {
            debug!("Resolved {:?} ({:?}) from cache", key.raw, hint);
            return Resolution { cached: true, ..hit };
        }

        let resolution = Self::run(&catalog, &key, hint);
        debug!(
            "Resolved {:?} ({:?}) to {} {} via {}",
            key.raw, hint, resolution.entity.kind, resolution.entity.id, resolution.strategy
        );

        if resolution.is_synthesized() && self.options.policy == SynthesisPolicy::Retain {
            state.retain_synthesized(
                resolution.entity.clone(),
                self.options.max_retained,
                generation,
            );
        }

        // A rebuild since the snapshot makes this result stale.
        if let Some(cache_key) = cache_key
            && state.snapshot().generation() == generation
        {
            self.cache.put(cache_key, generation, resolution.clone());
        }
        resolution
    }

    /// Steps 2 through 9 against one snapshot; no cache access.
    fn run(catalog: &Catalog, key: &LookupKey, hint: KindHint) -> Resolution {
        let candidates: Vec<&Entity> = catalog
            .authored()
            .filter(|e| hint.accepts(e.kind))
            .collect();

        if let Some((strategy, entity)) = strategy::run_cascade(key, &candidates) {
            return found(entity.clone(), strategy);
        }

        if hint == KindHint::Client {
            if let Some(name) = alias::canonical_client_name(&key.normalized) {
                if let Some(entity) = find_by_name(&candidates, name) {
                    return found(entity.clone(), Strategy::Alias);
                }
                let mut placeholder = synthesize(key, hint);
                placeholder.name = name.to_string();
                return found(placeholder, Strategy::Alias);
            }

            let others: Vec<&Entity> = catalog
                .authored()
                .filter(|e| e.kind != EntityKind::Client && !e.synthesized)
                .collect();
            if let Some((via, entity)) = strategy::run_cascade(key, &others) {
                debug!(
                    "Client key {:?} matched {} {} via {via}; treating as client",
                    key.raw, entity.kind, entity.id
                );
                let mut rescued = entity.clone();
                rescued.kind = EntityKind::Client;
                return found(rescued, Strategy::KindRescue);
            }
        }

        if let Some(entity) = strategy::partial_word(key, &candidates) {
            return found(entity.clone(), Strategy::PartialWord);
        }

        found(synthesize(key, hint), Strategy::Synthesized)
    }
}

const fn found(entity: Entity, strategy: Strategy) -> Resolution {
    Resolution {
        entity,
        strategy,
        cached: false,
    }
}

fn find_by_name<'a>(candidates: &[&'a Entity], name: &str) -> Option<&'a Entity> {
    candidates
        .iter()
        .copied()
        .find(|e| !e.synthesized && e.name.trim().eq_ignore_ascii_case(name))
}

/// Builds the placeholder for a key nothing matched.
#[must_use]
pub fn synthesize(key: &LookupKey, hint: KindHint) -> Entity {
    let kind = hint.kind().unwrap_or(EntityKind::Server);

    let bare = strategy::strip_client_prefix(&key.raw);
    let id = match (key.raw.is_empty(), kind) {
        (true, EntityKind::Client) => format!("{CLIENT_PREFIX}{BLANK_KEY_ID}"),
        (true, _) => BLANK_KEY_ID.to_string(),
        (false, EntityKind::Client) => format!("{CLIENT_PREFIX}{bare}"),
        (false, _) => key.raw.clone(),
    };

    let mut name = normalize::title_case_slug(bare);
    if name.is_empty() {
        name = normalize::title_case_slug(BLANK_KEY_ID);
    }

    let description = format!("{name} is not in the {kind} catalog yet.");
    let mut entity = Entity::new(id, kind, name).with_description(description);
    entity.synthesized = true;
    entity
}
