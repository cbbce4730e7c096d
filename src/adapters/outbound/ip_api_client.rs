//! ip-api.com Lookup Client
//!
//! Implements LookupClient against the ip-api.com JSON endpoint (or any
//! service answering `GET <base>/<address>` with the same body shape).

use crate::domain::entities::LookupRecord;
use crate::domain::errors::UpstreamError;
use crate::domain::ports::{LookupClient, UpstreamResponse};
use async_trait::async_trait;
use url::Url;

/// Default upstream base URL.
pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json";

/// HTTP lookup client.
///
/// No timeout is configured beyond reqwest's defaults and no request is
/// ever retried.
pub struct IpApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl IpApiClient {
    /// Create a client for `base_url`; a trailing slash is ignored.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client sharing an existing reqwest client.
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// URL for a lookup of `query`, or of the caller when `None`.
    ///
    /// The address becomes a single percent-encoded path segment, so `/`, `?`
    /// and `#` in it cannot change the upstream request.
    pub fn url_for(&self, query: Option<&str>) -> Result<String, UpstreamError> {
        let segment = query.unwrap_or_default();
        // Dot segments are resolved away even when encoded
        if !segment.is_empty() && segment.chars().all(|c| c == '.') {
            return Err(UpstreamError::Url(format!("invalid address {:?}", segment)));
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| UpstreamError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| UpstreamError::Url(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .push(segment);
        Ok(url.into())
    }
}

impl Default for IpApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_URL)
    }
}

#[async_trait]
impl LookupClient for IpApiClient {
    async fn lookup(&self, query: Option<&str>) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.url_for(query)?;

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            tracing::debug!("lookup {} answered with status {}", url, status);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Body(e.to_string()))?;

        let record: LookupRecord =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode {
                status,
                reason: e.to_string(),
            })?;

        Ok(UpstreamResponse { status, record })
    }
}
