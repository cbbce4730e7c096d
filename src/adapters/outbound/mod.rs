mod dashmap_store;
mod ip_api_client;
mod keys;
mod redis_store;

pub use dashmap_store::{DashMapStore, Value};
pub use ip_api_client::{IpApiClient, DEFAULT_LOOKUP_URL};
pub use keys::{profile_key, LIKE_COUNT_FIELD, POSTS_KEY, PROFILE_PREFIX};
pub use redis_store::RedisStore;
