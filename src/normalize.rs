// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Identifier normalization.
//!
//! Every lookup key, entity id and category label is reduced to a slug before
//! comparison: lowercase ASCII word characters separated by single hyphens.
//! Client ids carry a canonical `client-` prefix, which [`normalize`] strips so
//! that `client-cursor`, `Cursor` and `cursor` all compare equal.

use regex::Regex;
use std::sync::LazyLock;

/// Canonical prefix carried by client ids.
pub const CLIENT_PREFIX: &str = "client-";

#[allow(clippy::expect_used, reason = "pattern is a literal and always compiles")]
static NON_WORD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_]+").expect("valid non-word pattern"));

/// Canonicalizes a free-form name, slug or id into a comparable key.
///
/// Strips any leading `client-` prefix, lowercases, replaces every run of
/// non-word characters with a single hyphen and trims hyphens from both ends.
/// With `with_prefix`, the canonical client prefix is added back to a
/// non-empty result.
///
/// The function is total and idempotent: `normalize(&normalize(x, false),
/// false) == normalize(x, false)` for every input.
#[must_use]
pub fn normalize(raw: &str, with_prefix: bool) -> String {
    let slug = slugify(raw);
    let mut rest = slug.as_str();

    // "client-client-x" and "--client-x" both have to land on "x", or a
    // second pass would strip again.
    while let Some(stripped) = rest.strip_prefix(CLIENT_PREFIX) {
        rest = stripped;
    }

    if with_prefix && !rest.is_empty() {
        format!("{CLIENT_PREFIX}{rest}")
    } else {
        rest.to_string()
    }
}

/// Derives the canonical slug for a category label.
///
/// Same pipeline as [`normalize`] except that `&` becomes the word `and`
/// before the non-word collapse (`"AI & ML"` → `"ai-and-ml"`), and the client
/// prefix is left alone.
#[must_use]
pub fn category_slug(raw: &str) -> String {
    slugify(&raw.replace('&', " and "))
}

/// Lowercases, trims and hyphenates a string without any prefix handling.
#[must_use]
pub fn slugify(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    NON_WORD_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Reduces a string to its lowercase ASCII alphanumerics.
///
/// Used by the resolver's normalized-name and prefix strategies, where
/// punctuation and spacing differences must not matter at all.
#[must_use]
pub fn compact(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Builds a display name from a slug by title-casing each hyphen-separated word.
///
/// `"claude-desktop"` becomes `"Claude Desktop"`. Empty segments are skipped.
#[must_use]
pub fn title_case_slug(raw: &str) -> String {
    raw.trim()
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize("Claude Desktop", false), "claude-desktop");
        assert_eq!(normalize("client-Claude-Desktop", false), "claude-desktop");
        assert_eq!(
            normalize("claude-desktop", true),
            "client-claude-desktop"
        );
        assert_eq!(normalize("  GitHub   MCP  Server ", false), "github-mcp-server");
        assert_eq!(normalize("a--b__c", false), "a-b__c");
    }

    #[test]
    fn test_normalize_degenerate_inputs() {
        assert_eq!(normalize("", false), "");
        assert_eq!(normalize("", true), "");
        assert_eq!(normalize("!!!###", false), "");
        assert_eq!(normalize("---", true), "");
        assert_eq!(normalize("client-", false), "client");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "Claude Desktop",
            "client-client-cursor",
            "--client-x",
            "Ünïcödé Tööl",
            "AI & ML",
            "n8n",
            "  spaced   out  ",
            "client-",
            "_under_score_",
            "\u{212a}elvin",
            "",
        ];
        for input in inputs {
            let once = normalize(input, false);
            assert_eq!(normalize(&once, false), once, "input: {input:?}");
            let prefixed = normalize(input, true);
            assert_eq!(normalize(&prefixed, true), prefixed, "input: {input:?}");
        }
    }

    #[test]
    fn test_category_slug() {
        assert_eq!(category_slug("AI & ML"), "ai-and-ml");
        assert_eq!(category_slug("ai&ml"), "ai-and-ml");
        assert_eq!(category_slug("  Developer Tools "), "developer-tools");
        assert_eq!(category_slug("client-tools"), "client-tools");
        assert_eq!(category_slug(""), "");
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact("N8N"), "n8n");
        assert_eq!(compact("Claude-Desktop!"), "claudedesktop");
        assert_eq!(compact("###"), "");
    }

    #[test]
    fn test_title_case_slug() {
        assert_eq!(title_case_slug("claude-desktop"), "Claude Desktop");
        assert_eq!(title_case_slug("--my--tool-"), "My Tool");
        assert_eq!(title_case_slug("!!!###"), "!!!###");
        assert_eq!(title_case_slug(""), "");
    }
}
