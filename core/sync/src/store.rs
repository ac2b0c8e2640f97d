//! Storage collaborator seam.
//!
//! The concrete key-value backend lives outside this core; the sync engine
//! only needs to list locally modified entries and apply remote ones.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use glossvault_common::{GlossaryEntry, Result};

/// Local glossary storage as seen by the sync engine.
#[async_trait]
pub trait GlossaryStore: Send + Sync {
    /// Entries modified locally since the last successful sync, in order.
    async fn local_changes(&self) -> Result<Vec<GlossaryEntry>>;

    /// Merge decrypted remote entries into local storage.
    async fn apply_changes(&self, entries: Vec<GlossaryEntry>) -> Result<()>;
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    pending: RwLock<Vec<GlossaryEntry>>,
    entries: RwLock<HashMap<String, GlossaryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a local modification awaiting sync.
    pub async fn stage(&self, entry: GlossaryEntry) {
        self.pending.write().await.push(entry);
    }

    /// Drop all staged modifications.
    pub async fn clear_pending(&self) {
        self.pending.write().await.clear();
    }

    /// Snapshot of the merged entries, keyed by term.
    pub async fn entries(&self) -> HashMap<String, GlossaryEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl GlossaryStore for MemoryStore {
    async fn local_changes(&self) -> Result<Vec<GlossaryEntry>> {
        Ok(self.pending.read().await.clone())
    }

    async fn apply_changes(&self, entries: Vec<GlossaryEntry>) -> Result<()> {
        let mut merged = self.entries.write().await;
        for entry in entries {
            merged.insert(entry.term.clone(), entry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_staged_entries_are_listed_in_order() {
        let store = MemoryStore::new();
        store.stage(GlossaryEntry::new("b", "2", "c")).await;
        store.stage(GlossaryEntry::new("a", "1", "c")).await;

        let changes = store.local_changes().await.unwrap();
        assert_eq!(changes[0].term, "b");
        assert_eq!(changes[1].term, "a");
    }

    #[tokio::test]
    async fn test_apply_changes_upserts_by_term() {
        let store = MemoryStore::new();
        store
            .apply_changes(vec![GlossaryEntry::new("t", "old", "c")])
            .await
            .unwrap();
        store
            .apply_changes(vec![GlossaryEntry::new("t", "new", "c")])
            .await
            .unwrap();

        let entries = store.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["t"].definition, "new");
    }
}
