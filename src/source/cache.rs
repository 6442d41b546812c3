//! In-memory TTL cache for upstream responses
//!
//! A failed refetch falls back to the previous entry even when it has expired.
//! Callers therefore see stale data instead of an error whenever an upstream
//! had answered at least once during this cache's lifetime.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;
use tracing::{trace, warn};

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub fetched_at: Instant,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }
}

pub struct ResponseCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T> Default for ResponseCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> ResponseCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The map only ever holds complete entries, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached value for `key` if it has not expired
    pub fn get_fresh(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        self.lock()
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.data.clone())
    }

    /// Returns the cached value for `key`, calling `fetcher` on a miss or
    /// after expiry. When `fetcher` fails and an older entry exists, that
    /// entry is returned and the error is only logged.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetcher: F, ttl: Duration) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        if let Some(data) = self.get_fresh(key) {
            trace!(key, "Cache hit");
            return Ok(data);
        }

        match fetcher().await {
            Ok(data) => {
                self.lock().insert(
                    key.to_string(),
                    CacheEntry {
                        data: data.clone(),
                        fetched_at: Instant::now(),
                        ttl,
                    },
                );
                Ok(data)
            }
            Err(err) => {
                let stale = self.lock().get(key).map(|entry| entry.data.clone());
                match stale {
                    Some(data) => {
                        warn!(key, error = %err, "Refetch failed, serving stale cached response");
                        Ok(data)
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// Removes one entry; returns whether it existed
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Removes every entry whose key matches `pattern`; returns how many were removed
    pub fn invalidate_pattern(&self, pattern: &Regex) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !pattern.is_match(key));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
