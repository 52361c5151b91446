// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Historical client slugs.
//!
//! Client pages were published under a handful of slugs that no longer match
//! any id or name. Links to them still circulate, so they map to the
//! canonical client name here. Only consulted for client lookups.

use crate::normalize;

/// `(historical slug, canonical client name)`, slugs in normalized form.
const CLIENT_ALIASES: &[(&str, &str)] = &[
    ("claude", "Claude Desktop"),
    ("claude-app", "Claude Desktop"),
    ("claude-desktop", "Claude Desktop"),
    ("claude-ai", "Claude Desktop"),
    ("cursor-ide", "Cursor"),
    ("cursor-editor", "Cursor"),
    ("vscode", "Visual Studio Code"),
    ("vs-code", "Visual Studio Code"),
    ("github-copilot", "Visual Studio Code"),
    ("windsurf-editor", "Windsurf"),
    ("codeium-windsurf", "Windsurf"),
    ("zed-editor", "Zed"),
    ("continue-dev", "Continue"),
    ("cline-vscode", "Cline"),
    ("goose-ai", "Goose"),
    ("librechat-ai", "LibreChat"),
];

/// Canonical client name for a historical slug, if one is registered.
///
/// The key is normalized before lookup, so `Client-Claude-Desktop` and
/// `claude desktop` both hit.
#[must_use]
pub fn canonical_client_name(key: &str) -> Option<&'static str> {
    let key = normalize::normalize(key, false);
    CLIENT_ALIASES
        .iter()
        .find(|(slug, _)| *slug == key)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_aliases() {
        assert_eq!(canonical_client_name("claude-desktop"), Some("Claude Desktop"));
        assert_eq!(canonical_client_name("client-Claude-Desktop"), Some("Claude Desktop"));
        assert_eq!(canonical_client_name("VS Code"), Some("Visual Studio Code"));
        assert_eq!(canonical_client_name("cursor"), None);
        assert_eq!(canonical_client_name(""), None);
    }

    #[test]
    fn test_alias_slugs_are_normalized() {
        for (slug, name) in CLIENT_ALIASES {
            assert_eq!(normalize::normalize(slug, false), *slug);
            assert!(!name.is_empty());
        }
    }
}
