// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

/// Entity and raw record types.
pub mod entity;
/// Multi-source merge and category derivation.
pub mod merge;
/// Process-wide catalog snapshot with atomic replacement.
pub mod state;

pub use entity::{CategoryStats, Entity, EntityKind, KindHint, RawRecord};
pub use merge::merge;
pub use state::{Catalog, CatalogState};
