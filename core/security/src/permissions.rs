//! Host capability queries.
//!
//! The extension shell answers which capabilities the user has granted;
//! this module only defines the seam and a static implementation for
//! embedding and tests.

use std::collections::HashSet;

use async_trait::async_trait;

use glossvault_common::Result;

/// Source of the currently granted capability names.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Return the set of granted capability names.
    async fn granted(&self) -> Result<HashSet<String>>;
}

/// Fixed capability set, configured once at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    granted: HashSet<String>,
}

impl StaticPermissions {
    /// Create from an iterator of capability names.
    pub fn new(granted: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            granted: granted.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl PermissionSource for StaticPermissions {
    async fn granted(&self) -> Result<HashSet<String>> {
        Ok(self.granted.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_permissions_membership() {
        let perms = StaticPermissions::new(["storage", "activeTab"]);
        let granted = perms.granted().await.unwrap();

        assert!(granted.contains("storage"));
        assert!(!granted.contains("tabs"));
    }
}
