//! Stateless security rules: input validation, sanitization, content and
//! origin screening, and permission lookup.
//!
//! Denylist matching is a defense-in-depth layer; structured payloads get
//! an allow-based schema check in the middleware before these rules run.

use std::sync::{Arc, LazyLock};

use regex::RegexSet;
use tracing::warn;

use crate::permissions::PermissionSource;
use glossvault_common::Result;

/// Maximum accepted length for a single input field, in characters.
pub const MAX_INPUT_LENGTH: usize = 1000;

/// Maximum accepted length for protected content, in characters.
pub const MAX_CONTENT_SIZE: usize = 1_000_000;

/// Origin prefixes the glossary may run under.
const ALLOWED_ORIGINS: [&str; 2] = ["chrome-extension://", "moz-extension://"];

/// Markers rejected in user input fields.
static INPUT_DENYLIST: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)<script",
        r"(?i)javascript:",
        r"(?i)data:",
        r"(?i)vbscript:",
        r"(?i)on\w+=",
        r"(?i)\\\w+\(",
        r"(?i)String\.fromCharCode",
        r"(?i)<iframe",
        r"(?i)<embed",
        r"(?i)<object",
        r"(?i)eval\(",
        r"(?i)setTimeout",
        r"(?i)setInterval",
    ])
    .expect("input denylist patterns are valid")
});

/// Markers rejected in protected content. Broader families than the input
/// denylist, with a larger size ceiling.
static CONTENT_DENYLIST: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)<script",
        r"(?i)<iframe",
        r"(?i)<object",
        r"(?i)<embed",
        r"(?i)javascript:",
        r"(?i)data:text/html",
        r"(?i)eval\(",
        r"(?i)String\.fromCharCode",
        r"(?i)setTimeout",
        r"(?i)setInterval",
    ])
    .expect("content denylist patterns are valid")
});

/// Stateless rule set plus a handle to the host capability query.
#[derive(Clone)]
pub struct SecurityPolicy {
    permissions: Arc<dyn PermissionSource>,
}

impl SecurityPolicy {
    /// Create a policy backed by the given permission source.
    pub fn new(permissions: Arc<dyn PermissionSource>) -> Self {
        Self { permissions }
    }

    /// Check an input field against the length rule and the input denylist.
    pub fn validate_input(&self, input: &str) -> bool {
        if input.chars().count() > MAX_INPUT_LENGTH {
            return false;
        }
        !INPUT_DENYLIST.is_match(input)
    }

    /// Escape the fixed character set to HTML entities in a single pass.
    ///
    /// The entity map is total over `& < > " ' / \ ` =`; already-escaped
    /// sequences are not re-examined.
    pub fn sanitize_input(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        for ch in input.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#x27;"),
                '/' => out.push_str("&#x2F;"),
                '\\' => out.push_str("&#x5C;"),
                '`' => out.push_str("&#x60;"),
                '=' => out.push_str("&#x3D;"),
                other => out.push(other),
            }
        }
        out
    }

    /// Check protected content against the size ceiling and the content
    /// denylist.
    pub fn check_content_security(&self, content: &str) -> bool {
        if content.chars().count() > MAX_CONTENT_SIZE {
            return false;
        }
        !CONTENT_DENYLIST.is_match(content)
    }

    /// True iff the origin carries one of the allowed extension schemes.
    pub fn check_origin_security(&self, origin: &str) -> bool {
        ALLOWED_ORIGINS
            .iter()
            .any(|allowed| origin.starts_with(allowed))
    }

    /// True iff `operation` is among the granted capabilities.
    pub async fn is_operation_allowed(&self, operation: &str) -> Result<bool> {
        let granted = self.permissions.granted().await.inspect_err(|e| {
            warn!("Permission query failed: {}", e);
        })?;
        Ok(granted.contains(operation))
    }

    /// The currently granted capability names.
    pub async fn permissions(&self) -> Result<std::collections::HashSet<String>> {
        self.permissions.granted().await
    }
}
