//! Network transport for the sync endpoint.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use glossvault_common::{Error, ProtectedEntry, Result};

/// One round trip with the remote sync endpoint: submit the protected
/// local batch, receive the protected server-side changes to merge.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn exchange(&self, batch: &[ProtectedEntry]) -> Result<Vec<ProtectedEntry>>;
}

/// HTTP transport posting to `{api_url}/sync`.
pub struct HttpTransport {
    http: Client,
    api_url: String,
}

impl HttpTransport {
    /// Create a transport for the given API base URL.
    pub fn new(api_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .user_agent("GlossVault/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_url: api_url.into(),
        }
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    /// # Errors
    /// - `Error::Network` on transport-level failure
    /// - `Error::Sync` carrying the status text on any non-2xx response
    /// - `Error::Serialization` if the response body is not an entry array
    async fn exchange(&self, batch: &[ProtectedEntry]) -> Result<Vec<ProtectedEntry>> {
        let url = format!("{}/sync", self.api_url);
        debug!("Posting {} protected entries to {}", batch.len(), url);

        let response = self
            .http
            .post(&url)
            .json(batch)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Sync request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            return Err(Error::Sync(format!("Sync failed: {}", reason)));
        }

        response
            .json::<Vec<ProtectedEntry>>()
            .await
            .map_err(|e| Error::Serialization(format!("Malformed sync response: {}", e)))
    }
}
