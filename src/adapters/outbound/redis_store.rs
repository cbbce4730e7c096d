//! Redis Store
//!
//! Implements every store port on top of a Redis server using the async
//! `ConnectionManager`, which reconnects transparently between commands.

use super::keys::{profile_key, LIKE_COUNT_FIELD, POSTS_KEY};
use crate::domain::entities::{Post, ProfileUpdate, UserProfile};
use crate::domain::errors::StoreError;
use crate::domain::ports::{CacheStore, PostRepository, ProfileRepository, VoteRepository};
use crate::domain::value_objects::PageRequest;
use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use std::collections::HashMap;
use std::time::Duration;

/// Redis-backed store.
///
/// Cloning is cheap; clones share the same managed connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to the server at `url` (e.g. `redis://127.0.0.1:6379/0`).
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Remove every key from every database of the server.
    pub async fn flush_all(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("FLUSHALL")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| store_error("*", e))
    }
}

/// Map a client error for `key` into the domain error.
fn store_error(key: &str, e: RedisError) -> StoreError {
    if e.code() == Some("WRONGTYPE") {
        StoreError::WrongType(key.to_string())
    } else {
        StoreError::Backend(e.to_string())
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(|e| store_error(key, e))?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(&value[..]);
        if let Some(ttl) = ttl {
            // PX rejects 0
            let millis = ttl.as_millis().clamp(1, u64::MAX as u128) as u64;
            cmd.arg("PX").arg(millis);
        }
        cmd.query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| store_error(key, e))
    }
}

#[async_trait]
impl PostRepository for RedisStore {
    async fn prepend(&self, post: &Post) -> Result<(), StoreError> {
        let data = serde_json::to_string(post).map_err(|e| StoreError::Corrupt {
            key: POSTS_KEY.to_string(),
            reason: e.to_string(),
        })?;
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(POSTS_KEY, data)
            .await
            .map_err(|e| store_error(POSTS_KEY, e))
    }

    async fn page(&self, page: PageRequest) -> Result<Vec<Post>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn
            .lrange(POSTS_KEY, page.start() as isize, page.end() as isize)
            .await
            .map_err(|e| store_error(POSTS_KEY, e))?;

        raw.iter()
            .map(|item| {
                serde_json::from_str(item).map_err(|e| StoreError::Corrupt {
                    key: POSTS_KEY.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn remove(&self, post: &Post) -> Result<u64, StoreError> {
        let data = serde_json::to_string(post).map_err(|e| StoreError::Corrupt {
            key: POSTS_KEY.to_string(),
            reason: e.to_string(),
        })?;
        let mut conn = self.conn.clone();
        conn.lrem(POSTS_KEY, 1, data)
            .await
            .map_err(|e| store_error(POSTS_KEY, e))
    }
}

#[async_trait]
impl VoteRepository for RedisStore {
    async fn cast(&self, candidate: &str, voter: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let added: u64 = conn
            .sadd(candidate, voter)
            .await
            .map_err(|e| store_error(candidate, e))?;
        Ok(added > 0)
    }

    async fn tally(&self, candidate: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        conn.scard(candidate)
            .await
            .map_err(|e| store_error(candidate, e))
    }
}

#[async_trait]
impl ProfileRepository for RedisStore {
    async fn like_count(&self, id: &str) -> Result<Option<i64>, StoreError> {
        let key = profile_key(id);
        let mut conn = self.conn.clone();
        conn.hget(&key, LIKE_COUNT_FIELD)
            .await
            .map_err(|e| store_error(&key, e))
    }

    async fn like(&self, id: &str) -> Result<i64, StoreError> {
        let key = profile_key(id);
        let mut conn = self.conn.clone();
        conn.hincr(&key, LIKE_COUNT_FIELD, 1)
            .await
            .map_err(|e| store_error(&key, e))
    }

    async fn apply(&self, update: &ProfileUpdate) -> Result<(), StoreError> {
        let key = profile_key(&update.id);

        let mut pipe = redis::pipe();
        pipe.atomic();
        if !update.name.is_empty() {
            pipe.hset(&key, UserProfile::NAME, &update.name).ignore();
        }
        if !update.email.is_empty() {
            pipe.hset(&key, UserProfile::EMAIL, &update.email).ignore();
        }
        for field in update.increments() {
            pipe.hincr(&key, field, 1).ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| store_error(&key, e))
    }

    async fn get(&self, id: &str) -> Result<Option<UserProfile>, StoreError> {
        let key = profile_key(id);
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(&key)
            .await
            .map_err(|e| store_error(&key, e))?;

        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(UserProfile::from_fields(
            id,
            fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )))
    }
}
