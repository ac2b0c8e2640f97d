//! Common types used throughout GlossVault.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A glossary entry as held in local storage and edited by the user.
///
/// The `definition` field is the protected text field: it is the unit of
/// content-security screening and encryption. All other fields travel as
/// plain JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryEntry {
    /// The term being defined.
    pub term: String,
    /// Definition text. Encrypted at rest and in transit.
    pub definition: String,
    /// Category the entry belongs to.
    pub category: String,
    /// Optional free-form tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Creation timestamp (ISO-8601 on the wire).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last-modified timestamp (ISO-8601 on the wire).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl GlossaryEntry {
    /// Create an entry with the three required fields.
    pub fn new(
        term: impl Into<String>,
        definition: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
            category: category.into(),
            tags: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Output of one authenticated-encryption call.
///
/// The ciphertext must only ever be decrypted with the IV produced
/// alongside it and the key that was active when it was produced. IVs are
/// single-use: every encryption call generates a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedField {
    /// Base64-encoded ciphertext including the authentication tag.
    pub ciphertext: String,
    /// Base64-encoded 12-byte nonce.
    pub iv: String,
}

/// A glossary entry with its protected text field encrypted.
///
/// This is the shape entries take on the sync wire and at rest: identical
/// to [`GlossaryEntry`] except that `definition` is replaced by its
/// ciphertext/IV pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedEntry {
    pub term: String,
    /// Encrypted definition.
    pub definition: EncryptedField,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
