//! In-memory set of already-answered mention ids.
//!
//! Never persisted: a restart starts cold, so duplicate suppression is
//! at-least-once within a single process lifetime.

use std::collections::HashSet;

use tokio::sync::Mutex;

use crate::domain::MentionId;

#[derive(Default)]
pub struct DedupCache {
    seen: Mutex<HashSet<MentionId>>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_processed(&self, id: &MentionId) -> bool {
        self.seen.lock().await.contains(id)
    }

    /// Idempotent: marking an already-present id is a no-op.
    pub async fn mark_processed(&self, id: MentionId) {
        self.seen.lock().await.insert(id);
    }

    /// Empty the set, returning the prior cardinality.
    pub async fn clear(&self) -> usize {
        let mut seen = self.seen.lock().await;
        let removed = seen.len();
        seen.clear();
        removed
    }

    pub async fn len(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.seen.lock().await.is_empty()
    }
}
