//! Application Layer
//!
//! Use cases orchestrating the domain ports.

mod community_service;
mod lookup_service;

pub use community_service::{CommunityError, CommunityService, DEFAULT_CANDIDATE};
pub use lookup_service::{LookupError, LookupOutcome, LookupService, LookupSource};
