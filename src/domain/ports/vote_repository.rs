//! Vote Repository Port
//!
//! Defines the interface for the set-backed vote tally.

use crate::domain::errors::StoreError;
use async_trait::async_trait;

/// Distinct voters per candidate.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Record `voter` for `candidate`.
    ///
    /// Returns `false` when the voter had already voted; the tally is then
    /// unchanged. Check and insert happen in one store command.
    async fn cast(&self, candidate: &str, voter: &str) -> Result<bool, StoreError>;

    /// Number of distinct voters for `candidate`.
    async fn tally(&self, candidate: &str) -> Result<u64, StoreError>;
}
