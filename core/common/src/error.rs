//! Common error types for GlossVault.

use thiserror::Error;

/// Top-level error type for GlossVault operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed a pattern or length rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Required capability is missing.
    #[error("Permission error: {0}")]
    Permission(String),

    /// Content is oversized or matches a denylisted pattern.
    #[error("Content security error: {0}")]
    ContentSecurity(String),

    /// Encryption failed.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Decryption or authentication failed.
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Transport-level network failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Sync endpoint returned a non-success response.
    #[error("Sync error: {0}")]
    Sync(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
