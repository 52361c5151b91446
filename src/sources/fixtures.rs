// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Bundled catalog fixtures.
//!
//! Two JSON collections are compiled into the binary. Both hold MCP servers
//! and are tagged `server` on load. Fixture records are hand-maintained and
//! often incomplete, so missing display fields are backfilled here.

use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::{Entity, EntityKind, RawRecord};
use crate::sources::{Origin, Source, SourceError};

/// Category given to fixture records that have none.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Maximum length of a derived short description, before the ellipsis.
pub const SHORT_DESCRIPTION_CHARS: usize = 150;

const BUNDLED: [(&str, &str); 2] = [
    ("servers", include_str!("../../data/servers.json")),
    ("featured", include_str!("../../data/featured.json")),
];

/// Loader for fixture collections.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    collections: Vec<(String, String)>,
}

impl FixtureSource {
    /// The collections shipped with the crate.
    #[must_use]
    pub fn bundled() -> Self {
        Self {
            collections: BUNDLED
                .iter()
                .map(|(name, json)| ((*name).to_string(), (*json).to_string()))
                .collect(),
        }
    }

    /// Custom collections, each a `(name, json_array)` pair.
    #[must_use]
    pub fn from_collections<I, N, J>(collections: I) -> Self
    where
        I: IntoIterator<Item = (N, J)>,
        N: Into<String>,
        J: Into<String>,
    {
        Self {
            collections: collections
                .into_iter()
                .map(|(name, json)| (name.into(), json.into()))
                .collect(),
        }
    }

    /// Parses and backfills every collection, in declaration order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        let mut entities = Vec::new();

        for (name, json) in &self.collections {
            let records: Vec<Value> = match serde_json::from_str(json) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Fixture collection {name} is not a JSON array, skipping: {e}");
                    continue;
                }
            };

            let before = entities.len();
            for value in records {
                let record = serde_json::from_value::<RawRecord>(value)
                    .map_err(|e| SourceError::InvalidRecord(e.to_string()))
                    .and_then(|mut record| {
                        backfill(&mut record);
                        record.into_entity(EntityKind::Server)
                    });

                match record {
                    Ok(entity) => entities.push(entity),
                    Err(e) => warn!("Skipping fixture record in {name}: {e}"),
                }
            }
            debug!("Loaded {} fixture records from {name}", entities.len() - before);
        }

        entities
    }
}

impl Source for FixtureSource {
    fn origin(&self) -> Origin {
        Origin::Fixtures
    }

    async fn load(&self) -> Result<Vec<Entity>, SourceError> {
        Ok(self.entities())
    }
}

/// Fills in the display fields fixture records commonly omit.
pub fn backfill(record: &mut RawRecord) {
    if record.category.as_deref().is_none_or(|c| c.trim().is_empty()) {
        record.category = Some(DEFAULT_CATEGORY.to_string());
    }

    if record.short_description.is_none()
        && let Some(description) = &record.description
    {
        record.short_description = Some(truncate_with_ellipsis(description, SHORT_DESCRIPTION_CHARS));
    }

    if record.keywords.is_empty()
        && let Some(name) = &record.name
    {
        record.keywords = name
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
    }

    if record.official.is_none() {
        record.official = Some(false);
    }
}

/// Cuts `text` to `max_chars` characters and appends `...` if anything was cut.
#[must_use]
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_bundled_fixtures_load() {
        let entities = FixtureSource::bundled().entities();
        assert!(!entities.is_empty());
        assert!(entities.iter().all(|e| e.kind == EntityKind::Server));
        assert!(entities.iter().all(|e| e.category.is_some()));
        assert!(entities.iter().all(|e| !e.id.is_empty() && !e.name.is_empty()));
    }

    #[test]
    fn test_backfill_fields() -> Result<()> {
        let long = "x".repeat(200);
        let source = FixtureSource::from_collections([(
            "test",
            format!(r#"[{{"id": "a", "name": "Brave Search", "description": "{long}"}}]"#),
        )]);

        let entities = source.entities();
        let entity = entities.first().ok_or_else(|| anyhow::anyhow!("no entity"))?;

        assert_eq!(entity.category.as_deref(), Some(DEFAULT_CATEGORY));
        assert_eq!(entity.keywords, vec!["brave", "search"]);
        assert!(!entity.official);
        let short = entity.short_description.as_deref().unwrap_or_default();
        assert_eq!(short.chars().count(), SHORT_DESCRIPTION_CHARS + 3);
        assert!(short.ends_with("..."));
        Ok(())
    }

    #[test]
    fn test_backfill_keeps_existing_fields() -> Result<()> {
        let mut record: RawRecord = serde_json::from_value(serde_json::json!({
            "name": "GitHub",
            "category": "Developer Tools",
            "shortDescription": "Repos",
            "keywords": ["git"],
            "official": true
        }))?;
        backfill(&mut record);

        assert_eq!(record.category.as_deref(), Some("Developer Tools"));
        assert_eq!(record.short_description.as_deref(), Some("Repos"));
        assert_eq!(record.keywords, vec!["git"]);
        assert_eq!(record.official, Some(true));
        Ok(())
    }

    #[test]
    fn test_malformed_collection_is_skipped() {
        let source = FixtureSource::from_collections([
            ("broken", "{not json"),
            ("ok", r#"[{"id": "fs", "name": "Filesystem"}, {"description": "nameless"}]"#),
        ]);
        let entities = source.entities();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, "fs");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 150), "short");
        assert_eq!(truncate_with_ellipsis("abcdef", 3), "abc...");
        assert_eq!(truncate_with_ellipsis("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_with_ellipsis("abc", 3), "abc");
    }
}
