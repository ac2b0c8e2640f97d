//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! An iterated SHA-256 construction slows down brute-force attacks against
//! the passphrase while staying dependency-light and portable.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::keys::{GlossaryKey, Salt, KEY_LENGTH};
use glossvault_common::{Error, Result};

/// Parameters for PBKDF2 key derivation.
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Number of PBKDF2 iterations.
    pub iterations: u32,
}

impl KdfParams {
    /// Standard parameters for interactive use.
    pub fn interactive() -> Self {
        Self {
            iterations: 100_000,
        }
    }

    /// Minimal iteration count for tests. Never use outside tests.
    pub fn fast_insecure() -> Self {
        Self { iterations: 10 }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Derive a glossary key from a passphrase and salt.
///
/// # Preconditions
/// - `passphrase` must not be empty
/// - `params.iterations` must be non-zero
///
/// # Postconditions
/// - The derived key is deterministic given the same inputs
///
/// # Security
/// - The passphrase is not stored or logged
pub fn derive_key(passphrase: &[u8], salt: &Salt, params: &KdfParams) -> Result<GlossaryKey> {
    if passphrase.is_empty() {
        return Err(Error::Encryption("Passphrase cannot be empty".to_string()));
    }
    if params.iterations == 0 {
        return Err(Error::Encryption(
            "Iteration count must be non-zero".to_string(),
        ));
    }

    let mut key_bytes = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(passphrase, salt.as_bytes(), params.iterations, &mut key_bytes);

    Ok(GlossaryKey::from_bytes(key_bytes))
}
