// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Catalog change notifications.
//!
//! Interested collaborators (a search index, a page cache) subscribe to a
//! broadcast channel. Every event can additionally be appended to a JSONL
//! log file so catalog activity can be followed from another terminal with
//! `tail -f`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::catalog::EntityKind;

/// Buffered events per subscriber before the slowest one starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// An event published by the catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The specific event data.
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Types of catalog events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A new catalog was merged and published.
    CatalogUpdated {
        /// Authored entities in the new catalog.
        entities: usize,
        /// Derived categories in the new catalog.
        categories: usize,
    },
    /// The resolution cache was cleared.
    CacheInvalidated {
        /// Entries dropped.
        entries: usize,
    },
    /// A source could not be loaded and was skipped.
    SourceFailed {
        /// Which origin failed.
        origin: String,
        /// Why it failed.
        reason: String,
    },
    /// Locally stored records of one kind changed.
    EntityChanged {
        /// The kind that changed.
        kind: EntityKind,
    },
    /// A lookup found nothing and a placeholder was produced.
    Synthesized {
        /// The lookup key as received.
        key: String,
        /// Id of the placeholder.
        id: String,
    },
}

/// Cloneable event publisher.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<CatalogEvent>,
    log: Option<Arc<Mutex<File>>>,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroadcaster {
    /// Creates a broadcaster with no log file.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender, log: None }
    }

    /// Creates a broadcaster that also appends every event to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be opened for appending.
    pub fn with_log(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open event log {}", path.display()))?;

        let mut broadcaster = Self::new();
        broadcaster.log = Some(Arc::new(Mutex::new(file)));
        Ok(broadcaster)
    }

    /// Subscribes to every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. Never fails; having no subscribers is fine.
    pub fn send(&self, kind: EventKind) {
        let event = CatalogEvent {
            timestamp: Utc::now(),
            kind,
        };

        if let Some(log) = &self.log
            && let Ok(mut file) = log.lock()
            && let Ok(json) = serde_json::to_string(&event)
        {
            let _ = writeln!(file, "{json}");
            let _ = file.flush();
        }

        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_receive_events() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.send(EventKind::CacheInvalidated { entries: 3 });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::CacheInvalidated { entries: 3 });
    }

    #[test]
    fn test_send_without_subscribers() {
        let broadcaster = EventBroadcaster::new();
        broadcaster.send(EventKind::EntityChanged {
            kind: EntityKind::Agent,
        });
    }

    #[test]
    fn test_events_are_logged_as_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/events.jsonl");
        let broadcaster = EventBroadcaster::with_log(&path).unwrap();

        broadcaster.send(EventKind::CatalogUpdated {
            entities: 10,
            categories: 2,
        });
        broadcaster.send(EventKind::Synthesized {
            key: "nope".to_string(),
            id: "nope".to_string(),
        });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: CatalogEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(
            first.kind,
            EventKind::CatalogUpdated {
                entities: 10,
                categories: 2
            }
        );
        assert!(lines[1].contains(r#""type":"synthesized""#));
    }
}
