use std::collections::VecDeque;
use std::sync::RwLock;

use thiserror::Error;

use crate::publisher::JsonEnvelope;

#[derive(Debug, Error)]
pub enum ActivityFeedError {
    #[error("activity feed lock poisoned")]
    Poisoned,
}

/// Most recent domain events across all aggregates, newest first.
///
/// Disposable: rebuilt from whatever is published after startup. Duplicate
/// deliveries of the same envelope are ignored.
#[derive(Debug)]
pub struct ActivityFeed {
    capacity: usize,
    entries: RwLock<VecDeque<JsonEnvelope>>,
}

impl ActivityFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn apply_envelope(&self, envelope: JsonEnvelope) -> Result<(), ActivityFeedError> {
        let mut entries = self.entries.write().map_err(|_| ActivityFeedError::Poisoned)?;

        if entries.iter().any(|e| e.event_id() == envelope.event_id()) {
            return Ok(());
        }

        entries.push_front(envelope);
        entries.truncate(self.capacity);
        Ok(())
    }

    pub fn recent(&self, limit: usize) -> Vec<JsonEnvelope> {
        self.entries
            .read()
            .map(|e| e.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
