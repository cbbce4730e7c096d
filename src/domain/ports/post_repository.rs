//! Post Repository Port
//!
//! Defines the interface for the list-backed post feed.

use crate::domain::entities::Post;
use crate::domain::errors::StoreError;
use crate::domain::value_objects::PageRequest;
use async_trait::async_trait;

/// Newest-first feed of posts.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Add a post at the head of the feed.
    async fn prepend(&self, post: &Post) -> Result<(), StoreError>;

    /// Posts within the page's index range, newest first.
    async fn page(&self, page: PageRequest) -> Result<Vec<Post>, StoreError>;

    /// Remove the first occurrence of `post`. Returns how many were removed.
    async fn remove(&self, post: &Post) -> Result<u64, StoreError>;
}
