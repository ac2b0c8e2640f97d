//! Key types with secure memory handling.
//!
//! All key material automatically zeroizes its memory on drop to prevent
//! sensitive data from persisting in memory.

use std::fmt;

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use tokio::sync::OnceCell;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::kdf::{derive_key, KdfParams};
use glossvault_common::Result;

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of KDF salts in bytes.
pub const SALT_LENGTH: usize = 16;

/// Symmetric key protecting glossary content.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct GlossaryKey {
    key: [u8; KEY_LENGTH],
}

impl GlossaryKey {
    /// Create a key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for GlossaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlossaryKey([REDACTED])")
    }
}

/// Salt for key derivation.
#[derive(Debug, Clone)]
pub struct Salt(pub [u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt.
    pub fn generate() -> Self {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);
        Self(salt)
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }
}

/// Owner of the process-lifetime encryption key.
///
/// The key is derived lazily on first use and cached for the rest of the
/// process. Concurrent first callers collapse to a single derivation via
/// [`OnceCell`]; re-derivation never occurs while a cached key exists.
///
/// The salt is freshly randomized per process and never persisted, so
/// ciphertext produced in one session is not decryptable after a restart.
/// This is intentional: every sync exchange re-encrypts current plaintext
/// state, so no ciphertext needs to outlive the session.
pub struct KeyManager {
    passphrase: Zeroizing<Vec<u8>>,
    params: KdfParams,
    key: OnceCell<GlossaryKey>,
}

impl KeyManager {
    /// Passphrase used when none is supplied by the host.
    const DEFAULT_PASSPHRASE: &'static [u8] = b"glossary-secure-key";

    /// Create a key manager with an explicit passphrase.
    pub fn new(passphrase: impl Into<Vec<u8>>, params: KdfParams) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
            params,
            key: OnceCell::new(),
        }
    }

    /// Create a key manager with the built-in session passphrase.
    pub fn ephemeral() -> Self {
        Self::new(Self::DEFAULT_PASSPHRASE, KdfParams::default())
    }

    /// Get the cached key, deriving it on first call.
    ///
    /// # Postconditions
    /// - Exactly one derivation happens per manager, even under concurrent
    ///   first callers.
    pub async fn key(&self) -> Result<&GlossaryKey> {
        self.key
            .get_or_try_init(|| async {
                let salt = Salt::generate();
                derive_key(&self.passphrase, &salt, &self.params)
            })
            .await
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("params", &self.params)
            .field("derived", &self.key.initialized())
            .finish_non_exhaustive()
    }
}
