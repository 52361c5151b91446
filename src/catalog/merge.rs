// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Multi-source catalog merge.
//!
//! Sources are passed highest priority first. When the same logical entity
//! (same kind, same normalized id) shows up in more than one source, the
//! highest-priority record is kept as-is and the others are dropped; fields
//! are never combined across sources.

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::catalog::{Catalog, CategoryStats, Entity, EntityKind};
use crate::normalize;

/// Merges per-source entity lists into a single catalog.
///
/// Categories are derived from scratch on every call: one category entity
/// per distinct slug, appended after the authored entities in the order the
/// slugs were first seen.
#[must_use]
pub fn merge(sources: Vec<Vec<Entity>>) -> Catalog {
    let total: usize = sources.iter().map(Vec::len).sum();
    let mut seen: HashSet<(EntityKind, String)> = HashSet::with_capacity(total);
    let mut entities: Vec<Entity> = Vec::with_capacity(total);
    let mut dropped = 0usize;

    for mut entity in sources.into_iter().flatten() {
        if entity.is_category() {
            // Categories are derived here, never taken from a source.
            dropped += 1;
            continue;
        }

        let key = (entity.kind, dedup_key(&entity));
        if !seen.insert(key) {
            dropped += 1;
            continue;
        }

        entity.category_slug = entity
            .category
            .as_deref()
            .map(normalize::category_slug)
            .filter(|slug| !slug.is_empty());
        entities.push(entity);
    }

    let categories = derive_categories(&entities);
    debug!(
        "Merged {} entities ({} duplicates dropped), {} categories",
        entities.len(),
        dropped,
        categories.len()
    );

    entities.extend(categories);
    Catalog::new(entities)
}

/// Normalized id, falling back to the raw id for ids with no word characters.
fn dedup_key(entity: &Entity) -> String {
    let normalized = entity.normalized_id();
    if normalized.is_empty() {
        entity.id.clone()
    } else {
        normalized
    }
}

fn derive_categories(entities: &[Entity]) -> Vec<Entity> {
    // (slug, first raw form seen), in first-seen order.
    let mut order: Vec<(String, String)> = Vec::new();
    let mut stats: HashMap<String, CategoryStats> = HashMap::new();

    for entity in entities {
        let (Some(slug), Some(raw)) = (&entity.category_slug, &entity.category) else {
            continue;
        };

        let entry = stats.entry(slug.clone()).or_insert_with(|| {
            order.push((slug.clone(), raw.trim().to_string()));
            CategoryStats {
                slug: slug.clone(),
                count: 0,
                original_forms: BTreeSet::new(),
            }
        });
        entry.count += 1;
        entry.original_forms.insert(raw.clone());
    }

    order
        .into_iter()
        .filter_map(|(slug, name)| stats.remove(&slug).map(|s| category_entity(s, name)))
        .collect()
}

fn category_entity(stats: CategoryStats, name: String) -> Entity {
    let mut entity = Entity::new(stats.slug.clone(), EntityKind::Category, name);
    entity.category_slug = Some(stats.slug.clone());
    entity.category_stats = Some(stats);
    entity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(id: &str, name: &str, category: &str) -> Entity {
        Entity::new(id, EntityKind::Server, name).with_category(category)
    }

    #[test]
    fn test_higher_priority_source_wins_wholesale() {
        let local = vec![server("github", "GitHub (edited)", "Developer Tools")];
        let mut fixture = server("GitHub", "GitHub", "Version Control")
            .with_description("Repository access");
        fixture.stars = 900;

        let catalog = merge(vec![local, vec![fixture]]);
        let servers: Vec<&Entity> = catalog.of_kind(EntityKind::Server).collect();

        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].name, "GitHub (edited)");
        assert_eq!(servers[0].description, None);
        assert_eq!(servers[0].stars, 0);
    }

    #[test]
    fn test_same_id_different_kind_is_kept() {
        let catalog = merge(vec![vec![
            Entity::new("cursor", EntityKind::Server, "Cursor MCP"),
            Entity::new("client-cursor", EntityKind::Client, "Cursor"),
        ]]);
        assert_eq!(catalog.authored().count(), 2);
    }

    #[test]
    fn test_categories_aggregate_by_slug() {
        let catalog = merge(vec![vec![
            server("a", "A", "AI & ML"),
            server("b", "B", "ai and ml"),
            server("c", "C", "  AI  &  ML "),
            server("d", "D", "Databases"),
            Entity::new("e", EntityKind::Agent, "E"),
        ]]);

        let categories: Vec<&Entity> = catalog.categories().collect();
        assert_eq!(categories.len(), 2);

        let ai = catalog.category("ai-and-ml");
        let stats = ai.and_then(|c| c.category_stats.as_ref());
        assert_eq!(stats.map(|s| s.count), Some(3));
        assert_eq!(stats.map(|s| s.original_forms.len()), Some(3));
        assert!(stats.is_some_and(|s| s.original_forms.contains("ai and ml")));

        assert_eq!(categories[0].id, "ai-and-ml");
        assert_eq!(categories[0].name, "AI & ML");
        assert_eq!(categories[1].id, "databases");
        assert_eq!(catalog.in_category("AI & ML").count(), 3);
    }

    #[test]
    fn test_categories_follow_authored_entities() {
        let catalog = merge(vec![vec![server("a", "A", "Search")], vec![server("b", "B", "Search")]]);
        let kinds: Vec<EntityKind> = catalog.entities().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EntityKind::Server, EntityKind::Server, EntityKind::Category]
        );
    }

    #[test]
    fn test_source_categories_are_ignored() {
        let catalog = merge(vec![vec![Entity::new("stale", EntityKind::Category, "Stale")]]);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_blank_category_is_not_derived() {
        let catalog = merge(vec![vec![server("a", "A", " & ")]]);
        // " & " collapses to "and", which is a real slug.
        assert_eq!(catalog.categories().count(), 1);

        let catalog = merge(vec![vec![server("a", "A", "!!!")]]);
        assert_eq!(catalog.categories().count(), 0);
        assert_eq!(catalog.entities()[0].category_slug, None);
    }
}
