//! Cache Store Port
//!
//! Defines the interface for plain get/set access to the key-value store.

use crate::domain::errors::StoreError;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Opaque byte values addressed by string keys.
///
/// This is an outbound port used as the cache tier. Implementations perform
/// no retries; every failure goes straight back to the caller.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the value at `key`, or `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Write `value` at `key`, replacing any previous value.
    ///
    /// `ttl = None` stores the value without expiration.
    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<(), StoreError>;
}
