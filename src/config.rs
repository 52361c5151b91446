// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::resolve::{ResolverOptions, SynthesisPolicy};
use crate::sources::remote::{DEFAULT_LIMIT, DEFAULT_TIMEOUT};
use crate::store::Environment;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Namespace for local edits (default: production)
    #[serde(default)]
    pub environment: Environment,

    /// Directory holding locally persisted edits
    /// (default: `<data dir>/mcp-directory`)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Remote catalog API settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Placeholder handling for unresolvable lookups
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Optional JSONL file every catalog event is appended to
    #[serde(default)]
    pub events_log: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// API root; the products endpoint is `<base_url>/products`.
    /// The remote source is disabled when unset.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Page size requested from the API (default: 100)
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Request budget in milliseconds (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SynthesisConfig {
    /// "retain" keeps placeholders in the in-memory catalog, "discard" does not
    #[serde(default)]
    pub policy: SynthesisPolicy,

    /// Upper bound on retained placeholders (default: 256)
    #[serde(default = "default_max_retained")]
    pub max_retained: usize,
}

const fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "default timeout is a few seconds"
)]
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

const fn default_max_retained() -> usize {
    256
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            limit: default_limit(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            policy: SynthesisPolicy::default(),
            max_retained: default_max_retained(),
        }
    }
}

impl RemoteConfig {
    /// Request budget as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl SynthesisConfig {
    /// Resolver options derived from this section.
    #[must_use]
    pub const fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            policy: self.policy,
            max_retained: self.max_retained,
        }
    }
}

impl Config {
    /// Load configuration from standard paths or a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be read or a value has the
    /// wrong type.
    pub fn load(explicit_file: Option<PathBuf>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // 1. Start with defaults
        builder = builder
            .set_default("environment", "production")?
            .set_default("remote.limit", i64::from(default_limit()))?
            .set_default("remote.timeout_ms", default_timeout_ms())?
            .set_default("synthesis.policy", "retain")?
            .set_default("synthesis.max_retained", 256)?;

        // 2. Load from user config directory (~/.config/mcp-directory/config.toml)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("mcp-directory").join("config.toml");
            if config_path.exists() {
                builder = builder.add_source(config::File::from(config_path));
            }
        }

        // 3. Load from explicit file if provided
        if let Some(path) = explicit_file {
            builder = builder.add_source(config::File::from(path));
        }

        // 4. Load from environment variables (MCPDIR_ENVIRONMENT, MCPDIR_REMOTE__BASE_URL, etc.)
        builder = builder.add_source(
            config::Environment::with_prefix("MCPDIR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .context("Failed to build configuration")?;

        config.try_deserialize().context("Failed to deserialize configuration")
    }

    /// Directory for locally persisted edits, falling back to the platform
    /// data directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("mcp-directory")
        })
    }
}
