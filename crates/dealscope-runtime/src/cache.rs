//! Validated-reply cache.
//!
//! Enrichment replies are cacheable because the provider runs at
//! temperature 0 with a fixed seed: the same canonical deal JSON gets
//! the same reply. Keys are a hash of that canonical serialization.

use moka::future::Cache;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Duration;
use tracing::debug;

use crate::reply::ValidatedReply;

/// Cache key for a deal: hash of its canonical JSON.
pub fn deal_key(canonical_json: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    canonical_json.hash(&mut hasher);
    hasher.finish()
}

/// TTL + capacity bounded cache of validated replies.
#[derive(Clone)]
pub struct ReplyCache {
    inner: Cache<u64, ValidatedReply>,
}

impl ReplyCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, key: u64) -> Option<ValidatedReply> {
        let hit = self.inner.get(&key).await;
        debug!(key, hit = hit.is_some(), "reply cache lookup");
        hit
    }

    pub async fn insert(&self, key: u64, reply: ValidatedReply) {
        self.inner.insert(key, reply).await;
    }

    /// Number of cached replies (approximate, for logs).
    pub fn len(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
