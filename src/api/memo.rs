// src/api/memo.rs
//! Short-lived in-process memoization keyed by argument value.

use lru::LruCache;
use parking_lot::Mutex;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

/// Remembers results for a short window, evicting least-recently-used keys
/// beyond `capacity`.
///
/// Two concurrent misses for the same key both compute; the later insert
/// wins. Errors are never remembered.
pub struct Memo<K, V> {
    entries: Mutex<LruCache<K, (Instant, V)>>,
    window: Duration,
}

impl<K, V> Memo<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    pub fn new(capacity: usize, window: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            window,
        }
    }

    /// The remembered value, if it is still inside the window.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.window => Some(value.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.lock().put(key, (Instant::now(), value));
    }

    /// Returns the remembered value or computes, remembers and returns it.
    pub async fn get_or_try_insert_with<E, F, Fut>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Forgets everything.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_window_expiry() {
        let memo = Memo::new(8, Duration::from_secs(60));
        memo.insert("k", 1);
        assert_eq!(memo.get(&"k"), Some(1));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(memo.get(&"k"), None);
        assert!(memo.is_empty());
    }

    #[tokio::test]
    async fn test_errors_are_not_remembered() {
        let memo: Memo<&str, u32> = Memo::new(8, Duration::from_secs(60));

        let failed: Result<u32, &str> = memo.get_or_try_insert_with("k", || async { Err("no") }).await;
        assert!(failed.is_err());
        assert!(memo.is_empty());

        let value: Result<u32, &str> = memo.get_or_try_insert_with("k", || async { Ok(7) }).await;
        assert_eq!(value, Ok(7));
        let cached: Result<u32, &str> = memo.get_or_try_insert_with("k", || async { Ok(8) }).await;
        assert_eq!(cached, Ok(7));
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let memo = Memo::new(2, Duration::from_secs(60));
        memo.insert(1, "a");
        memo.insert(2, "b");
        memo.get(&1);
        memo.insert(3, "c");
        assert_eq!(memo.get(&2), None);
        assert_eq!(memo.get(&1), Some("a"));
        memo.clear();
        assert!(memo.is_empty());
    }
}
