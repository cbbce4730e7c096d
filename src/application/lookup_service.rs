//! Lookup Service - Read-through cache use case
//!
//! Serves address lookups from the key-value store, falling back to the
//! upstream lookup service on a miss and populating the store before
//! returning.

use crate::domain::entities::LookupRecord;
use crate::domain::errors::{StoreError, UpstreamError};
use crate::domain::ports::{CacheStore, LookupClient};
use crate::domain::value_objects::LookupKey;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Where a lookup result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// Served from the store without an upstream call
    Cached,
    /// Fetched from upstream; carries the upstream HTTP status
    Fetched { status: u16 },
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupOutcome {
    pub record: LookupRecord,
    pub source: LookupSource,
}

/// Failure of a lookup request, tagged with the step that failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LookupError {
    #[error("Failed to retrieve cached IP information")]
    CacheRead(#[source] StoreError),
    #[error("Failed to fetch IP information")]
    Upstream(#[source] UpstreamError),
    #[error("Failed to unmarshal IP information")]
    Decode(#[source] UpstreamError),
    #[error("Failed to encode IP information")]
    Encode(String),
    #[error("Failed to cache IP information")]
    CacheWrite(#[source] StoreError),
}

/// Read-through cache over the upstream lookup service.
///
/// Cached entries are treated as permanently valid: a present entry that
/// decodes is always returned instead of calling upstream. An entry that does
/// not decode is handled exactly like a missing one.
pub struct LookupService {
    store: Arc<dyn CacheStore>,
    client: Arc<dyn LookupClient>,
    ttl: Option<Duration>,
}

impl LookupService {
    /// Create a service whose cache entries never expire.
    pub fn new(store: Arc<dyn CacheStore>, client: Arc<dyn LookupClient>) -> Self {
        Self {
            store,
            client,
            ttl: None,
        }
    }

    /// Expire cache entries written by this service after `ttl`.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Look up `key`, serving from the cache when possible.
    ///
    /// Steps:
    /// 1. Read the cache entry for the key
    /// 2. Return it if it decodes into a record
    /// 3. Otherwise call upstream once, store the record, return it
    pub async fn lookup(&self, key: &LookupKey) -> Result<LookupOutcome, LookupError> {
        let cache_key = key.cache_key();

        // 1. Check
        let cached = self
            .store
            .get(cache_key)
            .await
            .map_err(LookupError::CacheRead)?;

        // 2. Hit
        if let Some(blob) = cached {
            match serde_json::from_slice::<LookupRecord>(&blob) {
                Ok(record) => {
                    tracing::debug!("lookup cache hit for {}", cache_key);
                    return Ok(LookupOutcome {
                        record,
                        source: LookupSource::Cached,
                    });
                }
                Err(e) => {
                    tracing::warn!("undecodable cache entry for {}, refetching: {}", cache_key, e);
                }
            }
        } else {
            tracing::debug!("lookup cache miss for {}", cache_key);
        }

        // 3. Fetch
        let response = self
            .client
            .lookup(key.query())
            .await
            .map_err(|e| match e {
                UpstreamError::Decode { .. } => LookupError::Decode(e),
                other => LookupError::Upstream(other),
            })?;

        // 4. Populate
        let encoded =
            serde_json::to_vec(&response.record).map_err(|e| LookupError::Encode(e.to_string()))?;
        self.store
            .set(cache_key, Bytes::from(encoded), self.ttl)
            .await
            .map_err(LookupError::CacheWrite)?;

        tracing::debug!(
            "cached lookup for {} (upstream status {})",
            cache_key,
            response.status
        );

        Ok(LookupOutcome {
            record: response.record,
            source: LookupSource::Fetched {
                status: response.status,
            },
        })
    }
}
