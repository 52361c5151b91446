// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Matching strategies.
//!
//! Every strategy is a pure function from a [`LookupKey`] and an ordered
//! candidate slice to the first matching candidate. The resolver walks them
//! in [`NAME_CASCADE`] order and stops at the first hit, so earlier
//! strategies always take precedence over later ones.

use serde::Serialize;
use std::fmt;

use crate::catalog::Entity;
use crate::normalize::{self, CLIENT_PREFIX};

/// Minimum compact key length for a prefix match.
const PREFIX_MIN_CHARS: usize = 3;

/// Minimum word length considered by the partial-word rescue.
const PARTIAL_WORD_MIN_CHARS: usize = 3;

/// Which step of the cascade produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Normalized id equality.
    ExactId,
    /// Hyphens-as-spaces key equals the name, case-insensitively.
    NameAsSlug,
    /// Alphanumerics-only key equals alphanumerics-only name.
    NormalizedName,
    /// Alphanumerics-only name starts with the alphanumerics-only key.
    Prefix,
    /// Historical client slug mapped to a canonical name.
    Alias,
    /// A client route matched an entity filed under another kind.
    KindRescue,
    /// A word of the key appears in a candidate's name.
    PartialWord,
    /// Nothing matched; a placeholder was fabricated.
    Synthesized,
}

impl Strategy {
    /// Short label for logs and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExactId => "exact_id",
            Self::NameAsSlug => "name_as_slug",
            Self::NormalizedName => "normalized_name",
            Self::Prefix => "prefix",
            Self::Alias => "alias",
            Self::KindRescue => "kind_rescue",
            Self::PartialWord => "partial_word",
            Self::Synthesized => "synthesized",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lookup key in every form the strategies compare against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    /// The key as received, trimmed.
    pub raw: String,
    /// [`normalize::normalize`] of the key.
    pub normalized: String,
    /// Key without a client prefix, hyphens as spaces, lowercased.
    pub spaced: String,
    /// Key without a client prefix, alphanumerics only, lowercased.
    pub compact: String,
}

impl LookupKey {
    /// Precomputes every comparison form of `raw`.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim();
        let bare = strip_client_prefix(raw);
        Self {
            raw: raw.to_string(),
            normalized: normalize::normalize(raw, false),
            spaced: bare.replace('-', " ").trim().to_lowercase(),
            compact: normalize::compact(bare),
        }
    }

    /// Hyphen-separated words of the normalized key.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.normalized.split('-').filter(|w| !w.is_empty())
    }
}

/// Case-insensitively strips one leading `client-`.
pub(crate) fn strip_client_prefix(raw: &str) -> &str {
    match raw.get(..CLIENT_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(CLIENT_PREFIX) => &raw[CLIENT_PREFIX.len()..],
        _ => raw,
    }
}

/// Signature shared by the name-based strategies.
pub type MatchFn = for<'a> fn(&LookupKey, &[&'a Entity]) -> Option<&'a Entity>;

/// Strategies 2 through 5 of the cascade, in precedence order.
pub const NAME_CASCADE: [(Strategy, MatchFn); 4] = [
    (Strategy::ExactId, exact_id),
    (Strategy::NameAsSlug, name_as_slug),
    (Strategy::NormalizedName, normalized_name),
    (Strategy::Prefix, prefix),
];

/// Runs [`NAME_CASCADE`] and returns the first strategy that matched.
#[must_use]
pub fn run_cascade<'a>(
    key: &LookupKey,
    candidates: &[&'a Entity],
) -> Option<(Strategy, &'a Entity)> {
    NAME_CASCADE
        .iter()
        .find_map(|(strategy, matcher)| matcher(key, candidates).map(|e| (*strategy, e)))
}

/// Normalized id equality. The only strategy that also sees placeholders.
#[must_use]
pub fn exact_id<'a>(key: &LookupKey, candidates: &[&'a Entity]) -> Option<&'a Entity> {
    if key.normalized.is_empty() {
        return None;
    }
    candidates
        .iter()
        .copied()
        .find(|e| e.normalized_id() == key.normalized)
}

/// Key with hyphens read as spaces equals the name, ignoring case.
#[must_use]
pub fn name_as_slug<'a>(key: &LookupKey, candidates: &[&'a Entity]) -> Option<&'a Entity> {
    if key.spaced.is_empty() {
        return None;
    }
    authored(candidates).find(|e| e.name.trim().to_lowercase() == key.spaced)
}

/// Alphanumerics-only key equals alphanumerics-only name.
#[must_use]
pub fn normalized_name<'a>(key: &LookupKey, candidates: &[&'a Entity]) -> Option<&'a Entity> {
    if key.compact.is_empty() {
        return None;
    }
    authored(candidates).find(|e| normalize::compact(&e.name) == key.compact)
}

/// Alphanumerics-only name starts with the alphanumerics-only key.
#[must_use]
pub fn prefix<'a>(key: &LookupKey, candidates: &[&'a Entity]) -> Option<&'a Entity> {
    if key.compact.chars().count() < PREFIX_MIN_CHARS {
        return None;
    }
    authored(candidates).find(|e| normalize::compact(&e.name).starts_with(&key.compact))
}

/// First candidate whose name contains a word of the key.
///
/// Words are tried in key order; for the first word with any hit, the
/// earliest candidate in catalog order wins even if several match.
#[must_use]
pub fn partial_word<'a>(key: &LookupKey, candidates: &[&'a Entity]) -> Option<&'a Entity> {
    let names: Vec<(String, &'a Entity)> = authored(candidates)
        .map(|e| (e.name.to_lowercase(), e))
        .collect();

    key.words()
        .filter(|word| word.chars().count() >= PARTIAL_WORD_MIN_CHARS)
        .find_map(|word| {
            names
                .iter()
                .find(|(name, _)| name.contains(word))
                .map(|(_, e)| *e)
        })
}

/// Candidates that are real catalog entries rather than placeholders.
fn authored<'a>(candidates: &[&'a Entity]) -> impl Iterator<Item = &'a Entity> {
    candidates.iter().copied().filter(|e| !e.synthesized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EntityKind;

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new("n8n", EntityKind::Server, "n8n"),
            Entity::new("github-mcp", EntityKind::Server, "GitHub"),
            Entity::new("brave", EntityKind::Server, "Brave Search"),
            Entity::new("pg", EntityKind::Server, "PostgreSQL Database"),
            Entity::new("client-claude-desktop", EntityKind::Client, "Claude Desktop"),
        ]
    }

    fn matched(matcher: MatchFn, key: &str) -> Option<String> {
        let all = entities();
        let refs: Vec<&Entity> = all.iter().collect();
        matcher(&LookupKey::new(key), &refs).map(|e| e.id.clone())
    }

    #[test]
    fn test_lookup_key_forms() {
        let key = LookupKey::new("  Client-Claude-Desktop ");
        assert_eq!(key.raw, "Client-Claude-Desktop");
        assert_eq!(key.normalized, "claude-desktop");
        assert_eq!(key.spaced, "claude desktop");
        assert_eq!(key.compact, "claudedesktop");
        assert_eq!(key.words().collect::<Vec<_>>(), vec!["claude", "desktop"]);
    }

    #[test]
    fn test_exact_id() {
        assert_eq!(matched(exact_id, "N8N").as_deref(), Some("n8n"));
        assert_eq!(matched(exact_id, "claude-desktop").as_deref(), Some("client-claude-desktop"));
        assert_eq!(matched(exact_id, "github"), None);
        assert_eq!(matched(exact_id, "!!!"), None);
    }

    #[test]
    fn test_name_as_slug() {
        assert_eq!(matched(name_as_slug, "brave-search").as_deref(), Some("brave"));
        assert_eq!(matched(name_as_slug, "Brave-Search").as_deref(), Some("brave"));
        assert_eq!(matched(name_as_slug, "brave"), None);
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(matched(normalized_name, "bravesearch").as_deref(), Some("brave"));
        assert_eq!(matched(normalized_name, "git_hub").as_deref(), Some("github-mcp"));
        assert_eq!(matched(normalized_name, "###"), None);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(matched(prefix, "postgres").as_deref(), Some("pg"));
        assert_eq!(matched(prefix, "gi"), None);
        assert_eq!(matched(prefix, "git").as_deref(), Some("github-mcp"));
    }

    #[test]
    fn test_partial_word_first_in_order() {
        // "search" appears only in Brave Search; "database" only in PostgreSQL.
        assert_eq!(matched(partial_word, "web-search-tool").as_deref(), Some("brave"));
        assert_eq!(matched(partial_word, "my-database").as_deref(), Some("pg"));
        // Short words are ignored.
        assert_eq!(matched(partial_word, "pg-db"), None);
    }

    #[test]
    fn test_cascade_prefers_exact_id_over_prefix() {
        let all = vec![
            Entity::new("other", EntityKind::Server, "Filesystem Extended"),
            Entity::new("files", EntityKind::Server, "Storage"),
        ];
        let refs: Vec<&Entity> = all.iter().collect();

        // "files" is a prefix of "filesystemextended" and the exact id of "Storage".
        let hit = run_cascade(&LookupKey::new("files"), &refs);
        assert_eq!(hit.map(|(s, e)| (s, e.id.as_str())), Some((Strategy::ExactId, "files")));
    }

    #[test]
    fn test_placeholders_only_match_by_id() {
        let mut ghost = Entity::new("ghost-tool", EntityKind::Server, "Ghost Tool");
        ghost.synthesized = true;
        let refs = vec![&ghost];

        assert!(exact_id(&LookupKey::new("ghost-tool"), &refs).is_some());
        assert!(name_as_slug(&LookupKey::new("ghost tool"), &refs).is_none());
        assert!(prefix(&LookupKey::new("ghost"), &refs).is_none());
        assert!(partial_word(&LookupKey::new("ghost"), &refs).is_none());
    }
}
