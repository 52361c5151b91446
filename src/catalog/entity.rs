// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Catalog entity types.
//!
//! [`RawRecord`] is the loose shape records arrive in (fixtures, the remote
//! API, local edits). [`Entity`] is the validated form the merger and
//! resolver work with.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

use crate::normalize::{self, CLIENT_PREFIX};
use crate::sources::SourceError;

/// Keys owned by [`Entity`] itself; never carried through `extra`.
const RESERVED_KEYS: [&str; 4] = ["kind", "categorySlug", "synthesized", "categoryStats"];

/// Discriminant for the shape of a catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// An MCP server.
    Server,
    /// An MCP client application.
    Client,
    /// An AI agent.
    Agent,
    /// A category derived by the merger.
    Category,
}

impl EntityKind {
    /// Kinds that are authored by a source rather than derived.
    pub const AUTHORED: [Self; 3] = [Self::Server, Self::Client, Self::Agent];

    /// Lowercase name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
            Self::Agent => "agent",
            Self::Category => "category",
        }
    }

    /// Fixed storage key under which local edits for this kind are kept.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Server => "servers",
            Self::Client => "clients",
            Self::Agent => "agents",
            Self::Category => "categories",
        }
    }

    /// Parses the loose kind labels seen in remote and stored records.
    ///
    /// Only authored kinds are recognized; `category` is never accepted from
    /// a source.
    #[must_use]
    pub fn parse_authored(label: &str) -> Option<Self> {
        match normalize::slugify(label).as_str() {
            "server" | "servers" | "mcp-server" | "mcp" => Some(Self::Server),
            "client" | "clients" | "mcp-client" => Some(Self::Client),
            "agent" | "agents" | "ai-agent" => Some(Self::Agent),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind hint supplied by the routing layer alongside a lookup key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindHint {
    /// Route belongs to the server catalog.
    Server,
    /// Route belongs to the client catalog.
    Client,
    /// Route belongs to the agent catalog.
    Agent,
    /// No kind known; every authored kind is a candidate.
    #[default]
    Unknown,
}

impl KindHint {
    /// The concrete kind, if the hint names one.
    #[must_use]
    pub const fn kind(self) -> Option<EntityKind> {
        match self {
            Self::Server => Some(EntityKind::Server),
            Self::Client => Some(EntityKind::Client),
            Self::Agent => Some(EntityKind::Agent),
            Self::Unknown => None,
        }
    }

    /// Whether an entity of `kind` is a candidate under this hint.
    #[must_use]
    pub fn accepts(self, kind: EntityKind) -> bool {
        kind != EntityKind::Category && self.kind().is_none_or(|k| k == kind)
    }
}

impl From<EntityKind> for KindHint {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Server => Self::Server,
            EntityKind::Client => Self::Client,
            EntityKind::Agent => Self::Agent,
            EntityKind::Category => Self::Unknown,
        }
    }
}

/// Aggregate carried by derived category entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    /// Canonical category slug.
    pub slug: String,
    /// Number of entities whose category collapses to this slug.
    pub count: usize,
    /// Distinct raw category strings that collapsed to this slug.
    pub original_forms: BTreeSet<String>,
}

/// A catalog record as it arrives from a source, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Identifier; numbers are accepted and stringified.
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    /// Declared kind, if the source carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Alternative kind field used by the remote API.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    /// Display name (`title` is accepted as an alias).
    #[serde(default, alias = "title")]
    pub name: Option<String>,
    /// Free-text category.
    #[serde(default)]
    pub category: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// One-line description.
    #[serde(default)]
    pub short_description: Option<String>,
    /// Long-form description.
    #[serde(default)]
    pub long_description: Option<String>,
    /// Key features list.
    #[serde(default, deserialize_with = "lenient_list")]
    pub key_features: Vec<String>,
    /// Use cases list.
    #[serde(default, deserialize_with = "lenient_list")]
    pub use_cases: Vec<String>,
    /// Tags.
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Vec<String>,
    /// Search keywords.
    #[serde(default, deserialize_with = "lenient_list")]
    pub keywords: Vec<String>,
    /// Star count.
    #[serde(default, deserialize_with = "lenient_count")]
    pub stars: Option<u64>,
    /// Whether the entry is maintained by the vendor.
    #[serde(default)]
    pub official: Option<bool>,
    /// Image path or URL (`image` is accepted as an alias).
    #[serde(default, alias = "image")]
    pub image_path: Option<String>,
    /// Any fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawRecord {
    /// Kind the record declares for itself, if recognizable.
    #[must_use]
    pub fn declared_kind(&self) -> Option<EntityKind> {
        self.kind
            .as_deref()
            .or(self.record_type.as_deref())
            .and_then(EntityKind::parse_authored)
    }

    /// Validates the record into an [`Entity`] of the given kind.
    ///
    /// A missing id is derived from the name slug and a missing name from
    /// the id. Client ids get the canonical `client-` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidRecord`] if neither a usable id nor a
    /// usable name is present.
    pub fn into_entity(self, kind: EntityKind) -> Result<Entity, SourceError> {
        let name = non_blank(self.name);
        let id = non_blank(self.id).or_else(|| {
            name.as_deref()
                .map(normalize::slugify)
                .filter(|slug| !slug.is_empty())
        });

        let Some(mut id) = id else {
            return Err(SourceError::InvalidRecord(format!(
                "{kind} record has no usable id or name"
            )));
        };

        let name = match name {
            Some(name) => name,
            None => {
                let derived = normalize::title_case_slug(&normalize::normalize(&id, false));
                if derived.is_empty() {
                    return Err(SourceError::InvalidRecord(format!(
                        "{kind} record {id:?} has no usable name"
                    )));
                }
                derived
            }
        };

        if kind == EntityKind::Client && !id.starts_with(CLIENT_PREFIX) {
            id = format!("{CLIENT_PREFIX}{id}");
        }

        let mut extra = self.extra;
        extra.retain(|key, _| !RESERVED_KEYS.contains(&key.as_str()));

        Ok(Entity {
            id,
            kind,
            name,
            category: non_blank(self.category),
            category_slug: None,
            description: self.description,
            short_description: self.short_description,
            long_description: self.long_description,
            key_features: self.key_features,
            use_cases: self.use_cases,
            tags: self.tags,
            keywords: self.keywords,
            stars: self.stars.unwrap_or(0),
            official: self.official.unwrap_or(false),
            image_path: self.image_path,
            synthesized: false,
            category_stats: None,
            extra,
        })
    }
}

/// A validated catalog entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Identifier, unique within its kind.
    pub id: String,
    /// Entity kind, set by the loader that produced it.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    /// Free-text category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Canonical slug of `category`, filled in by the merger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_slug: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// One-line description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    /// Long-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    /// Key features list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_features: Vec<String>,
    /// Use cases list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub use_cases: Vec<String>,
    /// Tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Search keywords.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Star count.
    #[serde(default)]
    pub stars: u64,
    /// Whether the entry is maintained by the vendor.
    #[serde(default)]
    pub official: bool,
    /// Image path or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// True for placeholders fabricated by the resolver.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthesized: bool,
    /// Aggregate for derived category entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_stats: Option<CategoryStats>,
    /// Fields carried through from the source untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    /// Creates a minimal entity with every display attribute defaulted.
    pub fn new(id: impl Into<String>, kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            category: None,
            category_slug: None,
            description: None,
            short_description: None,
            long_description: None,
            key_features: Vec::new(),
            use_cases: Vec::new(),
            tags: Vec::new(),
            keywords: Vec::new(),
            stars: 0,
            official: false,
            image_path: None,
            synthesized: false,
            category_stats: None,
            extra: Map::new(),
        }
    }

    /// Sets the category (builder style).
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the description (builder style).
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Normalized form of the id, used as the dedup and lookup key.
    #[must_use]
    pub fn normalized_id(&self) -> String {
        normalize::normalize(&self.id, false)
    }

    /// Whether this entity was derived by the merger rather than authored.
    #[must_use]
    pub fn is_category(&self) -> bool {
        self.kind == EntityKind::Category
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accepts a string or a number; anything else becomes `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts an array of strings, a comma-separated string, or null.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

/// Accepts a non-negative number or numeric string.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_count)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is checked to be finite and non-negative; saturating cast is fine for star counts"
)]
fn whole_count(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0).then(|| f.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn raw(value: Value) -> Result<RawRecord> {
        Ok(serde_json::from_value(value)?)
    }

    #[test]
    fn test_into_entity_defaults() -> Result<()> {
        let entity = raw(json!({"id": "github", "name": "GitHub"}))?.into_entity(EntityKind::Server)?;
        assert_eq!(entity.id, "github");
        assert_eq!(entity.kind, EntityKind::Server);
        assert_eq!(entity.stars, 0);
        assert!(!entity.official);
        assert!(!entity.synthesized);
        assert!(entity.tags.is_empty());
        Ok(())
    }

    #[test]
    fn test_client_ids_are_prefixed_once() -> Result<()> {
        let plain = raw(json!({"id": "cursor", "name": "Cursor"}))?.into_entity(EntityKind::Client)?;
        assert_eq!(plain.id, "client-cursor");

        let prefixed =
            raw(json!({"id": "client-cursor", "name": "Cursor"}))?.into_entity(EntityKind::Client)?;
        assert_eq!(prefixed.id, "client-cursor");
        Ok(())
    }

    #[test]
    fn test_missing_id_or_name_is_derived() -> Result<()> {
        let from_name = raw(json!({"name": "Brave Search"}))?.into_entity(EntityKind::Server)?;
        assert_eq!(from_name.id, "brave-search");

        let from_id = raw(json!({"id": "client-zed-editor"}))?.into_entity(EntityKind::Client)?;
        assert_eq!(from_id.name, "Zed Editor");
        Ok(())
    }

    #[test]
    fn test_unusable_record_is_rejected() -> Result<()> {
        let result = raw(json!({"description": "orphan"}))?.into_entity(EntityKind::Agent);
        assert!(matches!(result, Err(SourceError::InvalidRecord(_))));

        let result = raw(json!({"id": "  ", "name": ""}))?.into_entity(EntityKind::Agent);
        assert!(matches!(result, Err(SourceError::InvalidRecord(_))));
        Ok(())
    }

    #[test]
    fn test_lenient_fields() -> Result<()> {
        let record = raw(json!({
            "id": 42,
            "title": "Numbered",
            "tags": "a, b,,c",
            "stars": "17",
            "keyFeatures": null,
            "homepage": "https://example.com"
        }))?;
        assert_eq!(record.id.as_deref(), Some("42"));
        assert_eq!(record.name.as_deref(), Some("Numbered"));
        assert_eq!(record.tags, vec!["a", "b", "c"]);
        assert_eq!(record.stars, Some(17));
        assert!(record.key_features.is_empty());
        assert_eq!(record.extra.get("homepage"), Some(&json!("https://example.com")));
        Ok(())
    }

    #[test]
    fn test_reserved_keys_do_not_leak_into_extra() -> Result<()> {
        let stored = json!({
            "id": "x",
            "name": "X",
            "kind": "server",
            "categorySlug": "stale",
            "synthesized": true
        });
        let entity = raw(stored)?.into_entity(EntityKind::Agent)?;
        assert_eq!(entity.kind, EntityKind::Agent);
        assert!(entity.extra.is_empty());
        assert!(!entity.synthesized);

        // Serializing must not produce duplicate keys.
        let value = serde_json::to_value(&entity)?;
        assert_eq!(value["kind"], json!("agent"));
        Ok(())
    }

    #[test]
    fn test_declared_kind() -> Result<()> {
        assert_eq!(
            raw(json!({"type": "MCP Client"}))?.declared_kind(),
            Some(EntityKind::Client)
        );
        assert_eq!(raw(json!({"kind": "agents"}))?.declared_kind(), Some(EntityKind::Agent));
        assert_eq!(raw(json!({"kind": "category"}))?.declared_kind(), None);
        assert_eq!(raw(json!({}))?.declared_kind(), None);
        Ok(())
    }

    #[test]
    fn test_kind_hint_accepts() {
        assert!(KindHint::Unknown.accepts(EntityKind::Agent));
        assert!(!KindHint::Unknown.accepts(EntityKind::Category));
        assert!(KindHint::Client.accepts(EntityKind::Client));
        assert!(!KindHint::Client.accepts(EntityKind::Server));
    }
}
