//! Per-browser-session price caches.
//!
//! The session cookie carries a random cache key; the caches themselves stay
//! in process memory and are pruned once idle longer than the TTL.

use crate::domain::error::TwcorrError;
use crate::domain::price_cache::PriceCache;
use parking_lot::Mutex;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_sessions::Session;
use tracing::debug;

const CACHE_KEY: &str = "price_cache_key";

struct SessionEntry {
    cache: Arc<Mutex<PriceCache>>,
    last_access: Instant,
}

pub struct SessionCaches {
    ttl: Duration,
    entries: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionCaches {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_ttl_minutes(minutes: i64) -> Self {
        let secs = u64::try_from(minutes.max(1)).unwrap_or(1).saturating_mul(60);
        Self::new(Duration::from_secs(secs))
    }

    /// Cache for `key`, created on first use. Also drops idle sessions.
    pub fn cache_for(&self, key: &str) -> Arc<Mutex<PriceCache>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let before = entries.len();
        entries.retain(|k, e| k == key || now.duration_since(e.last_access) < self.ttl);
        if entries.len() < before {
            debug!(pruned = before - entries.len(), "expired session caches dropped");
        }

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| SessionEntry {
                cache: Arc::new(Mutex::new(PriceCache::new())),
                last_access: now,
            });
        if now.duration_since(entry.last_access) >= self.ttl {
            entry.cache.lock().clear();
        }
        entry.last_access = now;
        Arc::clone(&entry.cache)
    }

    /// Empties the cache for `key`; returns how many series were dropped.
    pub fn clear(&self, key: &str) -> usize {
        let entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) => {
                let mut cache = entry.cache.lock();
                let dropped = cache.len();
                cache.clear();
                dropped
            }
            None => 0,
        }
    }

    /// Number of live session caches.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

fn new_cache_key() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The cache key stored in `session`, minting one on first visit.
pub async fn session_cache_key(session: &Session) -> Result<String, TwcorrError> {
    let existing: Option<String> = session
        .get(CACHE_KEY)
        .await
        .map_err(|e| TwcorrError::Session {
            reason: e.to_string(),
        })?;
    if let Some(key) = existing {
        return Ok(key);
    }

    let key = new_cache_key();
    session
        .insert(CACHE_KEY, key.clone())
        .await
        .map_err(|e| TwcorrError::Session {
            reason: e.to_string(),
        })?;
    Ok(key)
}
