mod cache_store;
mod lookup_client;
mod post_repository;
mod profile_repository;
mod vote_repository;

pub use cache_store::CacheStore;
pub use lookup_client::{LookupClient, UpstreamResponse};
pub use post_repository::PostRepository;
pub use profile_repository::ProfileRepository;
pub use vote_repository::VoteRepository;
