//! kvdemo Library
//!
//! Exposes the kvdemo components for use in integration tests and as a
//! library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use adapters::inbound::{router, ApiServer, ApiState};
pub use adapters::outbound::{DashMapStore, IpApiClient, RedisStore};
pub use application::{CommunityService, LookupService};
pub use config::{load_config, Config, StoreBackend};
pub use domain::entities::{LookupRecord, Post, ProfileUpdate, UserProfile};
pub use domain::ports::{CacheStore, LookupClient, PostRepository, ProfileRepository, VoteRepository};
pub use domain::value_objects::{LookupKey, PageRequest};
pub use infrastructure::ShutdownController;
