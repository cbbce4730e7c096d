//! DashMap Store
//!
//! Implements every store port in process using DashMap for lock-free
//! concurrent access. Keys hold one kind of value each, like a Redis keyspace;
//! using a key with the wrong kind of command fails with `WrongType`.

use super::keys::{profile_key, LIKE_COUNT_FIELD, POSTS_KEY};
use crate::domain::entities::{Post, ProfileUpdate, UserProfile};
use crate::domain::errors::StoreError;
use crate::domain::ports::{CacheStore, PostRepository, ProfileRepository, VoteRepository};
use crate::domain::value_objects::PageRequest;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A single stored value.
#[derive(Debug, Clone)]
pub enum Value {
    String {
        data: Bytes,
        expires_at: Option<Instant>,
    },
    List(VecDeque<String>),
    Set(HashSet<String>),
    Hash(HashMap<String, String>),
}

impl Value {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self, Value::String { expires_at: Some(at), .. } if *at <= now)
    }
}

/// In-memory store.
///
/// Expired strings are dropped lazily when read and by `purge_expired`.
pub struct DashMapStore {
    entries: Arc<DashMap<String, Value>>,
}

impl DashMapStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Remove every key.
    pub fn flush_all(&self) {
        self.entries.clear();
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired strings. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        purge(&self.entries, Instant::now())
    }

    /// Start a background task purging expired strings every `interval`.
    pub fn start_gc(&self, interval: Duration) {
        let entries = self.entries.clone();

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let removed = purge(&entries, Instant::now());

                if removed > 0 {
                    tracing::debug!("store GC removed {} expired entries", removed);
                }
            }
        });
    }

    /// Get the underlying DashMap (for seeding and inspection in tests).
    #[allow(dead_code)]
    pub fn inner(&self) -> &Arc<DashMap<String, Value>> {
        &self.entries
    }

    /// Run `f` on the live value at `key`, treating expired values as absent.
    fn read<T>(&self, key: &str, f: impl FnOnce(Option<&Value>) -> T) -> T {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !entry.value().is_expired(now) => f(Some(entry.value())),
            Some(entry) => {
                drop(entry);
                self.entries.remove_if(key, |_, value| value.is_expired(now));
                f(None)
            }
            None => f(None),
        }
    }

    /// Run `f` on the value at `key`, creating it with `init` when absent.
    fn update<T>(
        &self,
        key: &str,
        init: impl FnOnce() -> Value,
        f: impl FnOnce(&mut Value) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(init());
                }
                f(occupied.get_mut())
            }
            Entry::Vacant(vacant) => {
                let mut value = init();
                let result = f(&mut value)?;
                vacant.insert(value);
                Ok(result)
            }
        }
    }
}

impl Default for DashMapStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove entries expired at `now`, counting only what this sweep removed.
fn purge(entries: &DashMap<String, Value>, now: Instant) -> usize {
    let mut removed = 0;
    entries.retain(|_, value| {
        let keep = !value.is_expired(now);
        if !keep {
            removed += 1;
        }
        keep
    });
    removed
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType(key.to_string())
}

fn encode_post(post: &Post) -> Result<String, StoreError> {
    serde_json::to_string(post).map_err(|e| StoreError::Corrupt {
        key: POSTS_KEY.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl CacheStore for DashMapStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.read(key, |value| match value {
            None => Ok(None),
            Some(Value::String { data, .. }) => Ok(Some(data.clone())),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<(), StoreError> {
        // SET replaces whatever kind of value the key held
        self.entries.insert(
            key.to_string(),
            Value::String {
                data: value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl PostRepository for DashMapStore {
    async fn prepend(&self, post: &Post) -> Result<(), StoreError> {
        let data = encode_post(post)?;
        self.update(
            POSTS_KEY,
            || Value::List(VecDeque::new()),
            |value| match value {
                Value::List(list) => {
                    list.push_front(data);
                    Ok(())
                }
                _ => Err(wrong_type(POSTS_KEY)),
            },
        )
    }

    async fn page(&self, page: PageRequest) -> Result<Vec<Post>, StoreError> {
        let raw: Vec<String> = self.read(POSTS_KEY, |value| match value {
            None => Ok(Vec::new()),
            Some(Value::List(list)) => {
                let start = page.start().max(0) as usize;
                let end = page.end().max(-1);
                if end < 0 || start >= list.len() {
                    return Ok(Vec::new());
                }
                let end = (end as usize).min(list.len() - 1);
                Ok(list.range(start..=end).cloned().collect())
            }
            Some(_) => Err(wrong_type(POSTS_KEY)),
        })?;

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
        let data = encode_post(post)?;
        let now = Instant::now();
        let Some(mut entry) = self.entries.get_mut(POSTS_KEY) else {
            return Ok(0);
        };
        if entry.value().is_expired(now) {
            return Ok(0);
        }
        let removed = match entry.value_mut() {
            Value::List(list) => match list.iter().position(|item| *item == data) {
                Some(index) => {
                    list.remove(index);
                    1
                }
                None => 0,
            },
            _ => return Err(wrong_type(POSTS_KEY)),
        };
        let now_empty = matches!(entry.value(), Value::List(list) if list.is_empty());
        drop(entry);

        // Redis deletes a list once its last element is removed
        if now_empty {
            self.entries
                .remove_if(POSTS_KEY, |_, value| matches!(value, Value::List(l) if l.is_empty()));
        }
        Ok(removed)
    }
}

#[async_trait]
impl VoteRepository for DashMapStore {
    async fn cast(&self, candidate: &str, voter: &str) -> Result<bool, StoreError> {
        self.update(
            candidate,
            || Value::Set(HashSet::new()),
            |value| match value {
                Value::Set(set) => Ok(set.insert(voter.to_string())),
                _ => Err(wrong_type(candidate)),
            },
        )
    }

    async fn tally(&self, candidate: &str) -> Result<u64, StoreError> {
        self.read(candidate, |value| match value {
            None => Ok(0),
            Some(Value::Set(set)) => Ok(set.len() as u64),
            Some(_) => Err(wrong_type(candidate)),
        })
    }
}

/// Add `delta` to an integer hash field, as HINCRBY does.
fn hincr(
    key: &str,
    hash: &mut HashMap<String, String>,
    field: &str,
    delta: i64,
) -> Result<i64, StoreError> {
    let current = match hash.get(field) {
        Some(raw) => raw.parse::<i64>().map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("hash field {} is not an integer", field),
        })?,
        None => 0,
    };
    let next = current.checked_add(delta).ok_or_else(|| StoreError::Corrupt {
        key: key.to_string(),
        reason: format!("increment of {} would overflow", field),
    })?;
    hash.insert(field.to_string(), next.to_string());
    Ok(next)
}

#[async_trait]
impl ProfileRepository for DashMapStore {
    async fn like_count(&self, id: &str) -> Result<Option<i64>, StoreError> {
        let key = profile_key(id);
        self.read(&key, |value| match value {
            None => Ok(None),
            Some(Value::Hash(hash)) => match hash.get(LIKE_COUNT_FIELD) {
                None => Ok(None),
                Some(raw) => raw.parse().map(Some).map_err(|_| StoreError::Corrupt {
                    key: key.clone(),
                    reason: format!("hash field {} is not an integer", LIKE_COUNT_FIELD),
                }),
            },
            Some(_) => Err(wrong_type(&key)),
        })
    }

    async fn like(&self, id: &str) -> Result<i64, StoreError> {
        let key = profile_key(id);
        self.update(
            &key,
            || Value::Hash(HashMap::new()),
            |value| match value {
                Value::Hash(hash) => hincr(&key, hash, LIKE_COUNT_FIELD, 1),
                _ => Err(wrong_type(&key)),
            },
        )
    }

    async fn apply(&self, update: &ProfileUpdate) -> Result<(), StoreError> {
        let key = profile_key(&update.id);
        self.update(
            &key,
            || Value::Hash(HashMap::new()),
            |value| {
                let Value::Hash(hash) = value else {
                    return Err(wrong_type(&key));
                };
                // Stage the changes so a failing increment leaves the hash untouched
                let mut staged = hash.clone();
                if !update.name.is_empty() {
                    staged.insert(UserProfile::NAME.to_string(), update.name.clone());
                }
                if !update.email.is_empty() {
                    staged.insert(UserProfile::EMAIL.to_string(), update.email.clone());
                }
                for field in update.increments() {
                    hincr(&key, &mut staged, field, 1)?;
                }
                *hash = staged;
                Ok(())
            },
        )
    }

    async fn get(&self, id: &str) -> Result<Option<UserProfile>, StoreError> {
        let key = profile_key(id);
        self.read(&key, |value| match value {
            None => Ok(None),
            Some(Value::Hash(hash)) if hash.is_empty() => Ok(None),
            Some(Value::Hash(hash)) => Ok(Some(UserProfile::from_fields(
                id,
                hash.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            ))),
            Some(_) => Err(wrong_type(&key)),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn post(key: &str, value: &str) -> Post {
        Post {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    // ===== CacheStore Tests =====

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = DashMapStore::new();
        assert_eq!(CacheStore::get(&store, "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = DashMapStore::new();
        store
            .set("myIP", Bytes::from_static(b"payload"), None)
            .await
            .unwrap();

        let value = CacheStore::get(&store, "myIP").await.unwrap();
        assert_eq!(value, Some(Bytes::from_static(b"payload")));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = DashMapStore::new();
        store.set("k", Bytes::from_static(b"1"), None).await.unwrap();
        store.set("k", Bytes::from_static(b"2"), None).await.unwrap();

        assert_eq!(
            CacheStore::get(&store, "k").await.unwrap(),
            Some(Bytes::from_static(b"2"))
        );
    }

    #[tokio::test]
    async fn test_ttl_expires_entry() {
        let store = DashMapStore::new();
        store
            .set("k", Bytes::from_static(b"v"), Some(Duration::from_millis(10)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(CacheStore::get(&store, "k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = DashMapStore::new();
        store
            .set("old", Bytes::from_static(b"v"), Some(Duration::from_millis(5)))
            .await
            .unwrap();
        store.set("keep", Bytes::from_static(b"v"), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.inner().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_purge_while_writers_insert() {
        let store = Arc::new(DashMapStore::new());
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                tokio::spawn(async move {
                    for i in 0..500 {
                        let ttl = (i % 2 == 0).then(|| Duration::from_millis(1));
                        store
                            .set(&format!("k{}-{}", t, i), Bytes::from_static(b"v"), ttl)
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();

        let mut purged = 0;
        while !writers.iter().all(|w| w.is_finished()) {
            purged += store.purge_expired();
            tokio::task::yield_now().await;
        }
        for writer in writers {
            writer.await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
        purged += store.purge_expired();

        // Every expiring key is counted exactly once across all sweeps
        assert_eq!(purged, 4 * 250);
        assert_eq!(store.len(), 4 * 250);
    }

    #[tokio::test]
    async fn test_get_on_list_is_wrong_type() {
        let store = DashMapStore::new();
        store.prepend(&post("a", "b")).await.unwrap();

        let err = CacheStore::get(&store, POSTS_KEY).await.unwrap_err();
        assert_eq!(err, StoreError::WrongType(POSTS_KEY.to_string()));
    }

    #[tokio::test]
    async fn test_flush_all() {
        let store = DashMapStore::new();
        store.set("a", Bytes::from_static(b"1"), None).await.unwrap();
        store.cast("candidate:1", "u1").await.unwrap();

        store.flush_all();
        assert!(store.is_empty());
    }

    // ===== PostRepository Tests =====

    #[tokio::test]
    async fn test_posts_page_range() {
        let store = DashMapStore::new();
        for i in 0..7 {
            store.prepend(&post(&format!("k{}", i), "v")).await.unwrap();
        }

        let first = store.page(PageRequest::new(1, 3).unwrap()).await.unwrap();
        let keys: Vec<_> = first.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["k6", "k5", "k4"]);

        let last = store.page(PageRequest::new(3, 3).unwrap()).await.unwrap();
        assert_eq!(last, vec![post("k0", "v")]);

        let beyond = store.page(PageRequest::new(4, 3).unwrap()).await.unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn test_posts_page_empty_list() {
        let store = DashMapStore::new();
        assert!(store.page(PageRequest::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_posts_remove_first_occurrence_only() {
        let store = DashMapStore::new();
        store.prepend(&post("a", "1")).await.unwrap();
        store.prepend(&post("a", "1")).await.unwrap();

        assert_eq!(store.remove(&post("a", "1")).await.unwrap(), 1);
        assert_eq!(store.page(PageRequest::default()).await.unwrap().len(), 1);
        assert_eq!(store.remove(&post("a", "2")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_posts_remove_last_deletes_key() {
        let store = DashMapStore::new();
        store.prepend(&post("a", "1")).await.unwrap();
        store.remove(&post("a", "1")).await.unwrap();

        assert!(store.is_empty());
        assert_eq!(store.remove(&post("a", "1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_posts_corrupt_element() {
        let store = DashMapStore::new();
        store.inner().insert(
            POSTS_KEY.to_string(),
            Value::List(VecDeque::from(vec!["{broken".to_string()])),
        );

        let err = store.page(PageRequest::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    // ===== VoteRepository Tests =====

    #[tokio::test]
    async fn test_votes_are_distinct() {
        let store = DashMapStore::new();
        assert!(store.cast("candidate:1", "u1").await.unwrap());
        assert!(store.cast("candidate:1", "u2").await.unwrap());
        assert!(!store.cast("candidate:1", "u1").await.unwrap());

        assert_eq!(store.tally("candidate:1").await.unwrap(), 2);
        assert_eq!(store.tally("candidate:2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_vote_on_string_key_is_wrong_type() {
        let store = DashMapStore::new();
        store.set("candidate:1", Bytes::from_static(b"x"), None).await.unwrap();

        assert_eq!(
            store.cast("candidate:1", "u1").await,
            Err(StoreError::WrongType("candidate:1".to_string()))
        );
    }

    // ===== ProfileRepository Tests =====

    #[tokio::test]
    async fn test_likes_increment() {
        let store = DashMapStore::new();
        assert_eq!(store.like_count("9").await.unwrap(), None);
        assert_eq!(store.like("9").await.unwrap(), 1);
        assert_eq!(store.like("9").await.unwrap(), 2);
        assert_eq!(store.like_count("9").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_profile_apply_and_get() {
        let store = DashMapStore::new();
        let update = ProfileUpdate {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            likes_count: 1,
            ..Default::default()
        };
        store.apply(&update).await.unwrap();
        store.like("u1").await.unwrap();

        let profile = ProfileRepository::get(&store, "u1").await.unwrap().unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.likes_count, 1);
        assert_eq!(store.like_count("u1").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_profile_apply_is_all_or_nothing() {
        let store = DashMapStore::new();
        let mut hash = HashMap::new();
        hash.insert("posts_count".to_string(), "many".to_string());
        store.inner().insert(profile_key("u1"), Value::Hash(hash));

        let update = ProfileUpdate {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            posts_count: 1,
            ..Default::default()
        };
        assert!(store.apply(&update).await.is_err());

        let profile = ProfileRepository::get(&store, "u1").await.unwrap().unwrap();
        assert!(profile.name.is_empty());
    }

    #[tokio::test]
    async fn test_profile_missing() {
        let store = DashMapStore::new();
        assert_eq!(ProfileRepository::get(&store, "ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_likes() {
        let store = Arc::new(DashMapStore::new());
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.like("hot").await.unwrap() }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.like_count("hot").await.unwrap(), Some(50));
    }
}
