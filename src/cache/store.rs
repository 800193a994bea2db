//! Fragment cache backends
//!
//! The backend contract is a single fetch-or-compute-and-store operation.
//! The sequence is read, check, then write; it is not atomic, and a backend
//! must not hold its own locks while `compute` runs so nested widgets can
//! reach the same store.

use crate::cache::key::{CacheKey, CacheOptions, KeyExpander};
use crate::error::{TrellisError, TrellisResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Closure producing fresh content on a miss
pub type Compute<'a> = &'a mut dyn FnMut() -> TrellisResult<String>;

/// A fragment cache capability
pub trait FragmentCache: Send + Sync {
    /// Return the content stored under `key`, computing and storing it on a miss
    fn fetch_or_store(
        &self,
        key: &CacheKey,
        options: &CacheOptions,
        compute: Compute<'_>,
    ) -> TrellisResult<String>;

    /// Human-readable backend name for logs
    fn store_name(&self) -> &'static str;
}

/// Hit, miss and write counters
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

/// In-process store backed by a hash map
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    expander: KeyExpander,
    stats: CacheStats,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expander(expander: KeyExpander) -> Self {
        Self {
            entries: Mutex::default(),
            expander,
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Read a stored fragment by its expanded storage key
    pub fn read(&self, storage_key: &str) -> TrellisResult<Option<String>> {
        Ok(self.lock()?.get(storage_key).cloned())
    }

    /// Storage keys currently held
    pub fn keys(&self) -> TrellisResult<Vec<String>> {
        let mut keys: Vec<String> = self.lock()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored fragment
    pub fn clear(&self) -> TrellisResult<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> TrellisResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| TrellisError::CacheBackend("memory store lock poisoned".to_string()))
    }
}

impl FragmentCache for MemoryStore {
    fn fetch_or_store(
        &self,
        key: &CacheKey,
        options: &CacheOptions,
        compute: Compute<'_>,
    ) -> TrellisResult<String> {
        let storage_key = self.expander.expand(key, options);

        let cached = self.lock()?.get(&storage_key).cloned();
        if let Some(content) = cached {
            debug!("Cache hit: {}", storage_key);
            self.stats.record_hit();
            return Ok(content);
        }

        debug!("Cache miss: {}", storage_key);
        self.stats.record_miss();
        let content = compute()?;

        self.lock()?.insert(storage_key, content.clone());
        self.stats.record_write();
        Ok(content)
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Store that never retains anything
#[derive(Debug, Default)]
pub struct NullStore {
    stats: CacheStats,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl FragmentCache for NullStore {
    fn fetch_or_store(
        &self,
        _key: &CacheKey,
        _options: &CacheOptions,
        compute: Compute<'_>,
    ) -> TrellisResult<String> {
        self.stats.record_miss();
        compute()
    }

    fn store_name(&self) -> &'static str {
        "null"
    }
}
