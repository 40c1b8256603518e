// src/cache/service.rs
//! Tagged, time-boxed result store.
//!
//! Results are kept as JSON snapshots: a hit hands back a fresh copy, and a
//! refresh replaces the whole entry. Nothing is ever mutated in place.

use super::domain::{CacheDomain, CacheTag, CacheTtls};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    json: Value,
    stored_at: Instant,
    ttl: Duration,
    tags: &'static [CacheTag],
    path: Option<String>,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }
}

/// Counters reported by the stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// The process-wide cache, built once at startup and shared by reference.
///
/// Two concurrent misses on one key may both compute and both store; the
/// last write wins.
pub struct CacheService {
    entries: DashMap<String, CacheEntry>,
    ttls: CacheTtls,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheService {
    pub fn new(ttls: CacheTtls) -> Self {
        Self {
            entries: DashMap::new(),
            ttls,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    /// Returns the fresh cached value for `key` in `domain`, or computes,
    /// stores and returns it.
    ///
    /// Errors from `compute` are passed through and nothing is stored.
    /// `path` lets path invalidation reach the entry as well as its tags.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        domain: CacheDomain,
        key: &str,
        path: Option<&str>,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let full_key = format!("{}:{}", domain.name(), key);

        if let Some(value) = self.lookup::<T>(&full_key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("Cache hit: {}", full_key);
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("Cache miss: {}", full_key);
        let value = compute().await?;

        match serde_json::to_value(&value) {
            Ok(json) => {
                self.entries.insert(
                    full_key,
                    CacheEntry {
                        json,
                        stored_at: Instant::now(),
                        ttl: self.ttls.ttl(domain),
                        tags: domain.tags(),
                        path: path.map(str::to_string),
                    },
                );
            }
            Err(e) => log::warn!("Not caching {}: {}", full_key, e),
        }

        Ok(value)
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = {
            let entry = self.entries.get(key)?;
            if entry.is_fresh() {
                Some(entry.json.clone())
            } else {
                None
            }
        };

        match json {
            Some(json) => match serde_json::from_value(json) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("Discarding undecodable cache entry {}: {}", key, e);
                    self.entries.remove(key);
                    None
                }
            },
            None => {
                self.entries.remove_if(key, |_, entry| !entry.is_fresh());
                None
            }
        }
    }

    /// Expires every entry carrying `tag`. Returns how many were removed.
    pub fn invalidate_tag(&self, tag: CacheTag) -> usize {
        self.remove_where(|entry| entry.tags.contains(&tag))
    }

    /// Expires every entry stored under `path` or below it. `/` reaches
    /// every entry that has a path.
    pub fn invalidate_path(&self, path: &str) -> usize {
        let root = path.trim_end_matches('/');
        let prefix = format!("{}/", root);
        self.remove_where(|entry| {
            entry
                .path
                .as_deref()
                .is_some_and(|p| p == root || p.starts_with(&prefix))
        })
    }

    /// Drops everything, counters included.
    pub fn purge(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn remove_where(&self, doomed: impl Fn(&CacheEntry) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !doomed(entry));
        before.saturating_sub(self.entries.len())
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::new(CacheTtls::default())
    }
}
