//! Authenticated encryption using AES-256-GCM.
//!
//! Every encryption call generates a fresh 12-byte nonce; ciphertext and
//! nonce are returned base64-encoded as an [`EncryptedField`] pair.

use std::sync::Arc;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::keys::KeyManager;
use glossvault_common::{EncryptedField, Error, Result};

/// Nonce size for AES-GCM (12 bytes).
pub const IV_LENGTH: usize = 12;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Seam for authenticated encryption of protected text fields.
///
/// Implemented by [`CryptoProvider`]; test doubles implement it to probe
/// call counts and failure paths.
#[async_trait]
pub trait Cipher: Send + Sync {
    /// Encrypt a plaintext string into a ciphertext/IV pair.
    async fn encrypt(&self, plaintext: &str) -> Result<EncryptedField>;

    /// Decrypt a ciphertext/IV pair back to plaintext.
    async fn decrypt(&self, field: &EncryptedField) -> Result<String>;
}

/// AES-256-GCM provider keyed by the process-lifetime [`KeyManager`].
pub struct CryptoProvider {
    keys: Arc<KeyManager>,
}

impl CryptoProvider {
    /// Create a provider over an existing key manager.
    pub fn new(keys: Arc<KeyManager>) -> Self {
        Self { keys }
    }

    /// Create a provider with a fresh ephemeral session key.
    pub fn ephemeral() -> Self {
        Self::new(Arc::new(KeyManager::ephemeral()))
    }
}

#[async_trait]
impl Cipher for CryptoProvider {
    /// # Postconditions
    /// - Repeated calls with identical plaintext produce different
    ///   ciphertext/IV pairs (the nonce is never reused).
    async fn encrypt(&self, plaintext: &str) -> Result<EncryptedField> {
        let key = self.keys.key().await?;
        let cipher = Aes256Gcm::new(key.as_bytes().into());
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| Error::Encryption(format!("Encryption failed: {}", e)))?;

        Ok(EncryptedField {
            ciphertext: BASE64.encode(ciphertext),
            iv: BASE64.encode(nonce),
        })
    }

    /// # Errors
    /// - `Error::Decryption` if either input is malformed, the nonce has
    ///   the wrong length, the authentication tag does not verify, or the
    ///   key is unavailable.
    async fn decrypt(&self, field: &EncryptedField) -> Result<String> {
        let key = self
            .keys
            .key()
            .await
            .map_err(|e| Error::Decryption(format!("Key unavailable: {}", e)))?;

        let ciphertext = BASE64
            .decode(&field.ciphertext)
            .map_err(|_| Error::Decryption("Malformed ciphertext encoding".to_string()))?;
        let iv = BASE64
            .decode(&field.iv)
            .map_err(|_| Error::Decryption("Malformed IV encoding".to_string()))?;

        if iv.len() != IV_LENGTH {
            return Err(Error::Decryption(format!(
                "Invalid IV length: expected {}, got {}",
                IV_LENGTH,
                iv.len()
            )));
        }
        if ciphertext.len() < TAG_SIZE {
            return Err(Error::Decryption("Ciphertext too short".to_string()));
        }

        let cipher = Aes256Gcm::new(key.as_bytes().into());
        let nonce = Nonce::from_slice(&iv);

        let plaintext = cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| Error::Decryption("Authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::Decryption("Plaintext is not valid UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::KdfParams;
    use proptest::prelude::*;

    fn test_provider() -> CryptoProvider {
        CryptoProvider::new(Arc::new(KeyManager::new(
            b"test-pass".to_vec(),
            KdfParams::fast_insecure(),
        )))
    }

    #[tokio::test]
    async fn test_encrypt_decrypt_roundtrip() {
        let provider = test_provider();

        let field = provider.encrypt("Hello, World!").await.unwrap();
        let decrypted = provider.decrypt(&field).await.unwrap();

        assert_eq!(decrypted, "Hello, World!");
    }

    #[tokio::test]
    async fn test_fresh_iv_per_call() {
        let provider = test_provider();

        let a = provider.encrypt("same plaintext").await.unwrap();
        let b = provider.encrypt("same plaintext").await.unwrap();

        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[tokio::test]
    async fn test_tampered_ciphertext_fails() {
        let provider = test_provider();

        let mut field = provider.encrypt("Important data").await.unwrap();
        let mut raw = BASE64.decode(&field.ciphertext).unwrap();
        raw[0] ^= 0xFF;
        field.ciphertext = BASE64.encode(raw);

        assert!(matches!(
            provider.decrypt(&field).await,
            Err(Error::Decryption(_))
        ));
    }

    #[tokio::test]
    async fn test_mismatched_iv_fails() {
        let provider = test_provider();

        let a = provider.encrypt("first").await.unwrap();
        let b = provider.encrypt("second").await.unwrap();

        let crossed = EncryptedField {
            ciphertext: a.ciphertext,
            iv: b.iv,
        };
        assert!(provider.decrypt(&crossed).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_inputs_fail() {
        let provider = test_provider();

        let bad_base64 = EncryptedField {
            ciphertext: "not base64!!!".to_string(),
            iv: "also not!!!".to_string(),
        };
        assert!(matches!(
            provider.decrypt(&bad_base64).await,
            Err(Error::Decryption(_))
        ));

        let short_iv = EncryptedField {
            ciphertext: BASE64.encode([0u8; 32]),
            iv: BASE64.encode([0u8; 4]),
        };
        assert!(matches!(
            provider.decrypt(&short_iv).await,
            Err(Error::Decryption(_))
        ));
    }

    #[tokio::test]
    async fn test_keys_differ_between_providers() {
        // Each provider derives with a fresh random salt, so ciphertext
        // from one session must not decrypt in another.
        let a = test_provider();
        let b = test_provider();

        let field = a.encrypt("session-bound").await.unwrap();
        assert!(b.decrypt(&field).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_plaintext() {
        let provider = test_provider();

        let field = provider.encrypt("").await.unwrap();
        assert_eq!(provider.decrypt(&field).await.unwrap(), "");
    }

    proptest! {
        #[test]
        fn prop_roundtrip_preserves_plaintext(plaintext in ".{0,200}") {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                let provider = test_provider();
                let field = provider.encrypt(&plaintext).await.unwrap();
                prop_assert_eq!(provider.decrypt(&field).await.unwrap(), plaintext);
                Ok(())
            })?;
        }
    }
}
