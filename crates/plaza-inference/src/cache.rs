// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response cache with TTL expiry and LRU eviction.
//!
//! Keyed by the normalized prompt key from [`crate::prompt::cache_key`].
//! Only responses that generated successfully, validated safe, and
//! scored below the cache admission threshold are inserted -- that
//! policy lives in the orchestrator; this module just stores what it is
//! given.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use plaza_core::ValidationVerdict;
use tokio::time::Instant;
use tracing::debug;

/// The payload stored for a cacheable reply.
#[derive(Debug, Clone)]
pub struct CachedReply {
    pub text: String,
    pub confidence: f32,
    pub risk_score: u8,
    pub token_count: u32,
    pub model: String,
    pub verdict: ValidationVerdict,
}

#[derive(Debug)]
struct CacheEntry {
    reply: CachedReply,
    created_at: Instant,
    ttl: Duration,
    hits: u64,
    /// Recency tick for LRU eviction.
    last_used: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.ttl
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    tick: u64,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
}

/// Concurrent response cache shared across in-flight requests.
///
/// The critical section is a handful of map operations; a blocking mutex
/// is cheaper here than an async one.
#[derive(Debug)]
pub struct ResponseCache {
    inner: Mutex<CacheInner>,
    max_entries: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl ResponseCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            max_entries,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Look up a reply. Expired entries are removed on access.
    pub fn get(&self, key: &str) -> Option<CachedReply> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;

        match inner.map.get_mut(key) {
            Some(entry) if entry.is_expired(now) => {
                inner.map.remove(key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) => {
                entry.hits += 1;
                entry.last_used = tick;
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.reply.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert a reply, evicting the least-recently-used entry when full.
    pub fn insert(&self, key: String, reply: CachedReply) {
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;

        if !inner.map.contains_key(&key) && inner.map.len() >= self.max_entries {
            // Linear scan is fine at the configured sizes.
            if let Some(lru_key) = inner
                .map
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            {
                inner.map.remove(&lru_key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %lru_key, "evicted least-recently-used cache entry");
            }
        }

        inner.map.insert(
            key,
            CacheEntry {
                reply,
                created_at: Instant::now(),
                ttl: self.ttl,
                hits: 0,
                last_used: tick,
            },
        );
    }

    /// Remove all expired entries, returning how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let before = inner.map.len();
        inner.map.retain(|_, e| !e.is_expired(now));
        let dropped = before - inner.map.len();
        self.expirations.fetch_add(dropped as u64, Ordering::Relaxed);
        dropped
    }

    /// Drop every entry (e.g. from an alert callback).
    pub fn clear(&self) {
        self.inner.lock().map.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
