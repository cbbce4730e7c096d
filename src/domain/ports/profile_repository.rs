//! Profile Repository Port
//!
//! Defines the interface for per-user hashes holding profile fields and
//! like counters.

use crate::domain::entities::{ProfileUpdate, UserProfile};
use crate::domain::errors::StoreError;
use async_trait::async_trait;

/// Hash-backed user profiles and like counters.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Current like count for `id`, or `None` if nothing was ever liked.
    async fn like_count(&self, id: &str) -> Result<Option<i64>, StoreError>;

    /// Increment the like count for `id` and return the new value.
    async fn like(&self, id: &str) -> Result<i64, StoreError>;

    /// Apply a partial profile update atomically.
    async fn apply(&self, update: &ProfileUpdate) -> Result<(), StoreError>;

    /// Read the profile for `id`, or `None` if the hash does not exist.
    async fn get(&self, id: &str) -> Result<Option<UserProfile>, StoreError>;
}
