//! Protection middleware gating every glossary read and write.
//!
//! Orchestrates the security policy and the cipher into the two intercept
//! operations plus the generic validation helpers. Validation never
//! panics or propagates internal errors: every failure surfaces as an
//! explicit [`Verdict`] or a typed [`Error`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::policy::SecurityPolicy;
use glossvault_common::{Error, GlossaryEntry, ProtectedEntry, Result};
use glossvault_crypto::Cipher;

/// Capability required for save/retrieve interception.
pub const STORAGE_OPERATION: &str = "storage";

/// Ceilings for the allow-based entry schema check.
const MAX_TERM_LENGTH: usize = 200;
const MAX_DEFINITION_LENGTH: usize = 1000;
const MAX_CATEGORY_LENGTH: usize = 100;
const MAX_TAG_LENGTH: usize = 64;
const MAX_TAG_COUNT: usize = 32;

/// Payload accompanying an operation check.
#[derive(Debug, Clone, Copy)]
pub enum OperationData<'a> {
    /// A bare string payload.
    Text(&'a str),
    /// An ordered sequence of string items (e.g. tags).
    Items(&'a [String]),
    /// A structured glossary entry.
    Entry(&'a GlossaryEntry),
}

/// Result of processing a payload through the middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessedData {
    /// String payloads are replaced by their encryption result.
    Encrypted(glossvault_common::EncryptedField),
    /// Sequences are sanitized element-wise, order preserved.
    Items(Vec<String>),
    /// Entries have every string field sanitized in place.
    Entry(GlossaryEntry),
}

/// Outcome of an operation check. Denials carry their reason so call
/// sites cannot silently ignore failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied(DenyReason),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }
}

/// Why an operation was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The host has not granted the capability for this operation.
    PermissionMissing { operation: String },
    /// The current origin is not an allowed extension origin.
    UntrustedOrigin { origin: String },
    /// A payload field failed the input denylist or length rule.
    InvalidInput { field: Option<String> },
    /// A structured payload failed the allow-based schema check.
    SchemaViolation { reason: String },
    /// The capability query itself failed.
    PermissionQueryFailed,
}

impl From<DenyReason> for Error {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::PermissionMissing { .. } | DenyReason::PermissionQueryFailed => {
                Error::Permission("Insufficient permissions".to_string())
            }
            DenyReason::UntrustedOrigin { origin } => {
                Error::Permission(format!("Untrusted origin: {}", origin))
            }
            DenyReason::InvalidInput { field } => match field {
                Some(name) => Error::Validation(format!("Invalid input in field: {}", name)),
                None => Error::Validation("Invalid input data".to_string()),
            },
            DenyReason::SchemaViolation { reason } => Error::Validation(reason),
        }
    }
}

/// Middleware gating every glossary read/write with permission checks,
/// validation, sanitization and authenticated encryption.
pub struct ProtectionMiddleware {
    policy: SecurityPolicy,
    cipher: Arc<dyn Cipher>,
    origin: String,
}

impl ProtectionMiddleware {
    /// Create a middleware for the given origin.
    pub fn new(policy: SecurityPolicy, cipher: Arc<dyn Cipher>, origin: impl Into<String>) -> Self {
        Self {
            policy,
            cipher,
            origin: origin.into(),
        }
    }

    /// Check whether an operation with an optional payload is allowed.
    ///
    /// Never errors: internal failures are logged and reported as denials.
    pub async fn validate_operation(
        &self,
        operation: &str,
        data: Option<OperationData<'_>>,
    ) -> Verdict {
        match self.policy.is_operation_allowed(operation).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Operation not allowed: {}", operation);
                return Verdict::Denied(DenyReason::PermissionMissing {
                    operation: operation.to_string(),
                });
            }
            Err(e) => {
                warn!("Permission query failed for {}: {}", operation, e);
                return Verdict::Denied(DenyReason::PermissionQueryFailed);
            }
        }

        if !self.policy.check_origin_security(&self.origin) {
            warn!("Invalid origin: {}", self.origin);
            return Verdict::Denied(DenyReason::UntrustedOrigin {
                origin: self.origin.clone(),
            });
        }

        match data {
            None => Verdict::Allowed,
            Some(OperationData::Text(text)) => {
                if self.policy.validate_input(text) {
                    Verdict::Allowed
                } else {
                    warn!("Invalid input data");
                    Verdict::Denied(DenyReason::InvalidInput { field: None })
                }
            }
            Some(OperationData::Items(items)) => {
                for item in items {
                    if !self.policy.validate_input(item) {
                        warn!("Invalid input data in sequence element");
                        return Verdict::Denied(DenyReason::InvalidInput { field: None });
                    }
                }
                Verdict::Allowed
            }
            Some(OperationData::Entry(entry)) => self.validate_entry(entry),
        }
    }

    /// Validate a structured entry: allow-based schema first, denylist on
    /// every string field second.
    fn validate_entry(&self, entry: &GlossaryEntry) -> Verdict {
        if let Err(reason) = check_entry_schema(entry) {
            warn!("Entry schema violation: {}", reason);
            return Verdict::Denied(DenyReason::SchemaViolation { reason });
        }

        let string_fields = [
            ("term", entry.term.as_str()),
            ("definition", entry.definition.as_str()),
            ("category", entry.category.as_str()),
        ];
        for (name, value) in string_fields {
            if !self.policy.validate_input(value) {
                warn!("Invalid input data in field: {}", name);
                return Verdict::Denied(DenyReason::InvalidInput {
                    field: Some(name.to_string()),
                });
            }
        }
        if let Some(tags) = &entry.tags {
            for tag in tags {
                if !self.policy.validate_input(tag) {
                    warn!("Invalid input data in field: tags");
                    return Verdict::Denied(DenyReason::InvalidInput {
                        field: Some("tags".to_string()),
                    });
                }
            }
        }

        Verdict::Allowed
    }

    /// Validate and transform a payload for the given operation.
    ///
    /// String payloads are encrypted; sequences and entries have their
    /// string content sanitized, other fields untouched and order
    /// preserved. Denials surface as typed errors.
    pub async fn process_data(
        &self,
        operation: &str,
        data: OperationData<'_>,
    ) -> Result<ProcessedData> {
        if let Verdict::Denied(reason) = self.validate_operation(operation, Some(data)).await {
            return Err(reason.into());
        }

        match data {
            OperationData::Text(text) => {
                let field = self.cipher.encrypt(text).await?;
                Ok(ProcessedData::Encrypted(field))
            }
            OperationData::Items(items) => Ok(ProcessedData::Items(
                items
                    .iter()
                    .map(|item| self.policy.sanitize_input(item))
                    .collect(),
            )),
            OperationData::Entry(entry) => {
                let mut sanitized = entry.clone();
                sanitized.term = self.policy.sanitize_input(&entry.term);
                sanitized.definition = self.policy.sanitize_input(&entry.definition);
                sanitized.category = self.policy.sanitize_input(&entry.category);
                if let Some(tags) = &entry.tags {
                    sanitized.tags =
                        Some(tags.iter().map(|t| self.policy.sanitize_input(t)).collect());
                }
                Ok(ProcessedData::Entry(sanitized))
            }
        }
    }

    /// Protect an entry for storage or transit.
    ///
    /// Content security runs before any other side effect: a rejected
    /// definition aborts the save with zero encryption calls. The
    /// `storage` capability is then required before the definition is
    /// replaced by its encryption result.
    pub async fn intercept_save(&self, entry: &GlossaryEntry) -> Result<ProtectedEntry> {
        if !self.check_content_security(&entry.definition) {
            return Err(Error::ContentSecurity("Invalid content detected".to_string()));
        }

        let allowed = self
            .policy
            .is_operation_allowed(STORAGE_OPERATION)
            .await
            .unwrap_or(false);
        if !allowed {
            return Err(Error::Permission("Insufficient permissions".to_string()));
        }

        let definition = self.cipher.encrypt(&entry.definition).await?;
        debug!("Protected entry for term: {}", entry.term);

        Ok(ProtectedEntry {
            term: entry.term.clone(),
            definition,
            category: entry.category.clone(),
            tags: entry.tags.clone(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        })
    }

    /// Restore a protected entry's plaintext definition.
    pub async fn intercept_retrieve(&self, entry: &ProtectedEntry) -> Result<GlossaryEntry> {
        let definition = self
            .cipher
            .decrypt(&entry.definition)
            .await
            .map_err(|e| {
                warn!("Failed to decrypt entry {}: {}", entry.term, e);
                Error::Decryption("Decryption failed".to_string())
            })?;

        Ok(GlossaryEntry {
            term: entry.term.clone(),
            definition,
            category: entry.category.clone(),
            tags: entry.tags.clone(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        })
    }

    /// Sanitized input if it validates, else a validation error.
    pub fn validate_and_sanitize_input(&self, input: &str) -> Result<String> {
        if !self.policy.validate_input(input) {
            return Err(Error::Validation("Invalid input data".to_string()));
        }
        Ok(self.policy.sanitize_input(input))
    }

    /// Content security screen. Never propagates errors.
    pub fn check_content_security(&self, content: &str) -> bool {
        self.policy.check_content_security(content)
    }
}

/// Allow-based structural gate for entries. Denylist rules run after this.
fn check_entry_schema(entry: &GlossaryEntry) -> std::result::Result<(), String> {
    if entry.term.trim().is_empty() {
        return Err("Term must not be empty".to_string());
    }
    if entry.term.chars().count() > MAX_TERM_LENGTH {
        return Err(format!("Term exceeds {} characters", MAX_TERM_LENGTH));
    }
    if entry.definition.chars().count() > MAX_DEFINITION_LENGTH {
        return Err(format!(
            "Definition exceeds {} characters",
            MAX_DEFINITION_LENGTH
        ));
    }
    if entry.category.chars().count() > MAX_CATEGORY_LENGTH {
        return Err(format!("Category exceeds {} characters", MAX_CATEGORY_LENGTH));
    }
    if let Some(tags) = &entry.tags {
        if tags.len() > MAX_TAG_COUNT {
            return Err(format!("More than {} tags", MAX_TAG_COUNT));
        }
        if tags.iter().any(|t| t.chars().count() > MAX_TAG_LENGTH) {
            return Err(format!("Tag exceeds {} characters", MAX_TAG_LENGTH));
        }
    }
    Ok(())
}
