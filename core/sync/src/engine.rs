//! The sync procedure: protect, exchange, restore, apply.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::store::GlossaryStore;
use crate::transport::SyncTransport;
use glossvault_common::Result;
use glossvault_security::ProtectionMiddleware;

/// Orchestrates one synchronization pass. Every byte sent or received
/// passes through the protection middleware.
pub struct SyncEngine {
    middleware: Arc<ProtectionMiddleware>,
    transport: Arc<dyn SyncTransport>,
    store: Arc<dyn GlossaryStore>,
}

impl SyncEngine {
    pub fn new(
        middleware: Arc<ProtectionMiddleware>,
        transport: Arc<dyn SyncTransport>,
        store: Arc<dyn GlossaryStore>,
    ) -> Self {
        Self {
            middleware,
            transport,
            store,
        }
    }

    /// Run one full sync pass.
    ///
    /// All local entries are protected before anything is sent; the
    /// response is fully received before any decryption begins. Entry
    /// order is preserved through both fan-out phases, and the first
    /// failure aborts the pass with nothing submitted or applied.
    ///
    /// No retry happens here; bounded retry is the scheduler's job.
    pub async fn sync(&self) -> Result<()> {
        let local = self.store.local_changes().await?;
        debug!("Protecting {} local changes", local.len());

        let protected = try_join_all(
            local
                .iter()
                .map(|entry| self.middleware.intercept_save(entry)),
        )
        .await?;

        let remote = self.transport.exchange(&protected).await?;
        debug!("Received {} remote changes", remote.len());

        let decrypted = try_join_all(
            remote
                .iter()
                .map(|entry| self.middleware.intercept_retrieve(entry)),
        )
        .await?;

        self.store.apply_changes(decrypted).await?;
        info!(
            "Sync completed: {} sent, {} received",
            protected.len(),
            remote.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use glossvault_common::{EncryptedField, Error, GlossaryEntry, ProtectedEntry};
    use glossvault_crypto::Cipher;
    use glossvault_security::{SecurityPolicy, StaticPermissions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Reversible tagging cipher so tests can see through the encryption.
    struct TagCipher;

    #[async_trait]
    impl Cipher for TagCipher {
        async fn encrypt(&self, plaintext: &str) -> glossvault_common::Result<EncryptedField> {
            Ok(EncryptedField {
                ciphertext: format!("encrypted_{}", plaintext),
                iv: "test-iv".to_string(),
            })
        }

        async fn decrypt(&self, field: &EncryptedField) -> glossvault_common::Result<String> {
            field
                .ciphertext
                .strip_prefix("encrypted_")
                .map(str::to_string)
                .ok_or_else(|| Error::Decryption("Authentication failed".to_string()))
        }
    }

    /// Transport double that records batches and echoes a canned reply.
    struct RecordingTransport {
        calls: AtomicUsize,
        batches: Mutex<Vec<Vec<ProtectedEntry>>>,
        reply: Mutex<Vec<ProtectedEntry>>,
        echo: bool,
    }

    impl RecordingTransport {
        fn replying(reply: Vec<ProtectedEntry>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                batches: Mutex::new(Vec::new()),
                reply: Mutex::new(reply),
                echo: false,
            }
        }

        fn echoing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                batches: Mutex::new(Vec::new()),
                reply: Mutex::new(Vec::new()),
                echo: true,
            }
        }
    }

    #[async_trait]
    impl SyncTransport for RecordingTransport {
        async fn exchange(
            &self,
            batch: &[ProtectedEntry],
        ) -> glossvault_common::Result<Vec<ProtectedEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.batches.lock().await.push(batch.to_vec());
            if self.echo {
                Ok(batch.to_vec())
            } else {
                Ok(self.reply.lock().await.clone())
            }
        }
    }

    fn middleware() -> Arc<ProtectionMiddleware> {
        let policy = SecurityPolicy::new(Arc::new(StaticPermissions::new(["storage"])));
        Arc::new(ProtectionMiddleware::new(
            policy,
            Arc::new(TagCipher),
            "chrome-extension://abcdef",
        ))
    }

    fn protected(term: &str, definition: &str) -> ProtectedEntry {
        ProtectedEntry {
            term: term.to_string(),
            definition: EncryptedField {
                ciphertext: format!("encrypted_{}", definition),
                iv: "test-iv".to_string(),
            },
            category: "default".to_string(),
            tags: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_empty_local_changes_still_issues_one_exchange() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport::replying(vec![protected(
            "remote", "from server",
        )]));
        let engine = SyncEngine::new(middleware(), transport.clone(), store.clone());

        engine.sync().await.unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(transport.batches.lock().await[0].is_empty());
        // Remote changes are decrypted and applied even with nothing to send.
        let entries = store.entries().await;
        assert_eq!(entries["remote"].definition, "from server");
    }

    #[tokio::test]
    async fn test_round_trip_preserves_order_and_content() {
        let store = Arc::new(MemoryStore::new());
        store.stage(GlossaryEntry::new("beta", "second", "c")).await;
        store.stage(GlossaryEntry::new("alpha", "first", "c")).await;

        let transport = Arc::new(RecordingTransport::echoing());
        let engine = SyncEngine::new(middleware(), transport.clone(), store.clone());

        engine.sync().await.unwrap();

        let batch = &transport.batches.lock().await[0];
        assert_eq!(batch[0].term, "beta");
        assert_eq!(batch[1].term, "alpha");
        assert_eq!(batch[0].definition.ciphertext, "encrypted_second");

        let entries = store.entries().await;
        assert_eq!(entries["beta"].definition, "second");
        assert_eq!(entries["alpha"].definition, "first");
    }

    #[tokio::test]
    async fn test_rejected_entry_aborts_before_submission() {
        let store = Arc::new(MemoryStore::new());
        store.stage(GlossaryEntry::new("good", "fine", "c")).await;
        store
            .stage(GlossaryEntry::new(
                "bad",
                "x<script>alert(1)</script>",
                "c",
            ))
            .await;

        let transport = Arc::new(RecordingTransport::echoing());
        let engine = SyncEngine::new(middleware(), transport.clone(), store.clone());

        let err = engine.sync().await.unwrap_err();
        assert!(matches!(err, Error::ContentSecurity(_)));
        // No partial submission: the transport never saw the batch.
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_undecryptable_remote_entry_fails_the_pass() {
        let store = Arc::new(MemoryStore::new());
        let garbage = ProtectedEntry {
            definition: EncryptedField {
                ciphertext: "tampered".to_string(),
                iv: "test-iv".to_string(),
            },
            ..protected("remote", "ignored")
        };
        let transport = Arc::new(RecordingTransport::replying(vec![garbage]));
        let engine = SyncEngine::new(middleware(), transport, store.clone());

        let err = engine.sync().await.unwrap_err();
        assert!(matches!(err, Error::Decryption(_)));
        assert!(store.entries().await.is_empty());
    }
}
