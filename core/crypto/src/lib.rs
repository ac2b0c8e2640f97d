//! Cryptographic primitives for GlossVault.
//!
//! This module provides:
//! - Key derivation using PBKDF2-HMAC-SHA256
//! - Authenticated encryption using AES-256-GCM
//! - A memoized key manager for the process-lifetime session key
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - Nonces are freshly generated per encryption call, never reused

pub mod kdf;
pub mod keys;
pub mod provider;

pub use kdf::{derive_key, KdfParams};
pub use keys::{GlossaryKey, KeyManager, Salt};
pub use provider::{Cipher, CryptoProvider};
