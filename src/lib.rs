// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! MCP Directory catalog resolution service.
//!
//! Merges catalog entities (MCP servers, clients and agents) from bundled
//! fixtures, a remote API and locally persisted edits into one addressable
//! catalog, and resolves arbitrary, often malformed, route keys to exactly
//! one entity through a cascade of fallback strategies.

/// Catalog entities, multi-source merge and the published snapshot.
pub mod catalog;
/// Command-line interface definitions and utilities.
pub mod cli;
/// Configuration loading.
pub mod config;
/// Catalog change events.
pub mod events;
/// Identifier and category slug normalization.
pub mod normalize;
/// Entity resolution cascade and cache.
pub mod resolve;
/// Service tying loaders, catalog and resolver together.
pub mod service;
/// Source loaders for fixtures, the remote API and local edits.
pub mod sources;
/// Key-value storage for local edits.
pub mod store;
