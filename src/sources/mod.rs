// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Source loaders.
//!
//! Each loader reads raw records from one origin, validates them into
//! kind-tagged [`Entity`] values and hands ownership to the caller. Loaders
//! never fail past their own boundary in a way the caller has to abort on:
//! a failing origin yields a [`SourceError`] that the caller logs before
//! moving on to the next origin.

/// Bundled, compile-time catalog fixtures.
pub mod fixtures;
/// Locally persisted admin edits.
pub mod local;
/// Remote catalog API.
pub mod remote;

use std::fmt;
use std::future::Future;
use thiserror::Error;

use crate::catalog::Entity;
use crate::store::Environment;

pub use fixtures::FixtureSource;
pub use local::LocalSource;
pub use remote::RemoteSource;

/// Where a batch of records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Fixtures compiled into the binary.
    Fixtures,
    /// The remote catalog API.
    Remote,
    /// Local edits in the given environment namespace.
    Local(Environment),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixtures => f.write_str("fixtures"),
            Self::Remote => f.write_str("remote"),
            Self::Local(env) => write!(f, "local:{env}"),
        }
    }
}

/// Recoverable loader failures.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network failure, timeout, bad status or malformed response.
    #[error("{origin} source unavailable: {reason}")]
    Unavailable {
        /// Origin that failed.
        origin: Origin,
        /// Human-readable cause.
        reason: String,
    },

    /// Stored JSON could not be parsed.
    #[error("corrupt local data under {namespace}/{key}: {source}")]
    CorruptLocalData {
        /// Storage namespace.
        namespace: String,
        /// Storage key.
        key: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A single record failed validation.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The key-value store itself failed.
    #[error("storage error: {0}")]
    Store(String),
}

impl SourceError {
    pub(crate) fn unavailable(origin: Origin, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            origin,
            reason: reason.into(),
        }
    }
}

/// A catalog origin that can be loaded in full.
pub trait Source {
    /// Identifies the origin for logs and events.
    fn origin(&self) -> Origin;

    /// Loads every record this origin holds.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the origin cannot be read at all. Invalid
    /// individual records are dropped with a warning instead.
    fn load(&self) -> impl Future<Output = Result<Vec<Entity>, SourceError>> + Send;
}
