//! Lookup Client Port
//!
//! Defines the interface for querying the upstream geolocation service.

use crate::domain::entities::LookupRecord;
use crate::domain::errors::UpstreamError;
use async_trait::async_trait;

/// A decoded upstream answer together with the HTTP status it came with.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub record: LookupRecord,
}

/// Client for the upstream lookup service.
///
/// Implementations issue exactly one request per call and decode the body
/// whatever the status code is.
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Look up `query`, or the caller's own address when `None`.
    async fn lookup(&self, query: Option<&str>) -> Result<UpstreamResponse, UpstreamError>;
}
