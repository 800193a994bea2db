//! Disk-backed fragment store
//!
//! Each fragment lives in its own JSON file named after the SHA256 of its
//! storage key. Entries may carry an expiry; expired entries read as misses
//! and are overwritten on the next store.

use crate::cache::key::{CacheKey, CacheOptions, KeyExpander};
use crate::cache::store::{CacheStats, Compute, FragmentCache};
use crate::error::{TrellisError, TrellisResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// One stored fragment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Expanded storage key
    pub key: String,

    /// Rendered markup
    pub content: String,

    /// When the fragment was stored
    pub created_at: DateTime<Utc>,

    /// When the fragment stops being served, if ever
    pub expires_at: Option<DateTime<Utc>>,
}

impl FileEntry {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }
}

/// Summary of what a store directory holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreUsage {
    pub entries: usize,
    pub expired: usize,
    pub bytes: u64,
}

/// Fragment store writing JSON entries under a directory
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    expander: KeyExpander,
    ttl: Option<Duration>,
    stats: CacheStats,
}

impl FileStore {
    /// Create a store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_expander(dir, KeyExpander::default())
    }

    pub fn with_expander(dir: impl Into<PathBuf>, expander: KeyExpander) -> Self {
        Self {
            dir: dir.into(),
            expander,
            ttl: None,
            stats: CacheStats::default(),
        }
    }

    /// Expire stored fragments after `ttl`
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn entry_path(&self, storage_key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(storage_key.as_bytes());
        self.dir
            .join(format!("{}.json", hex::encode(hasher.finalize())))
    }

    fn read_entry(&self, path: &Path) -> TrellisResult<Option<FileEntry>> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TrellisError::CacheEntryRead {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        match serde_json::from_str::<FileEntry>(&content) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn write_entry(&self, path: &Path, entry: &FileEntry) -> TrellisResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            TrellisError::io(format!("creating cache directory {}", self.dir.display()), e)
        })?;

        // Each writer gets its own temp file; concurrent misses race on the rename only
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| {
            TrellisError::io(format!("creating temp entry in {}", self.dir.display()), e)
        })?;
        serde_json::to_writer(&mut tmp, entry)?;
        tmp.flush()
            .map_err(|e| TrellisError::io(format!("writing cache entry {}", path.display()), e))?;
        tmp.persist(path).map_err(|e| {
            TrellisError::io(format!("replacing cache entry {}", path.display()), e.error)
        })?;
        Ok(())
    }

    /// All readable entries, oldest first
    pub async fn entries(&self) -> TrellisResult<Vec<FileEntry>> {
        let mut entries = Vec::new();
        for path in self.entry_files().await? {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| TrellisError::io(format!("reading {}", path.display()), e))?;
            match serde_json::from_str::<FileEntry>(&content) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping corrupt cache entry {}: {}", path.display(), e),
            }
        }
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    /// Entry counts and total size on disk
    pub async fn usage(&self) -> TrellisResult<StoreUsage> {
        let mut usage = StoreUsage::default();
        for path in self.entry_files().await? {
            let meta = tokio::fs::metadata(&path)
                .await
                .map_err(|e| TrellisError::io(format!("inspecting {}", path.display()), e))?;
            usage.entries += 1;
            usage.bytes += meta.len();
        }
        usage.expired = self
            .entries()
            .await?
            .iter()
            .filter(|e| e.is_expired())
            .count();
        Ok(usage)
    }

    /// Remove every entry, returning how many were removed
    pub async fn clear(&self) -> TrellisResult<usize> {
        let mut removed = 0;
        for path in self.entry_files().await? {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| TrellisError::io(format!("removing {}", path.display()), e))?;
            removed += 1;
        }
        debug!("Cleared {} cache entries from {}", removed, self.dir.display());
        Ok(removed)
    }

    /// Remove expired and unreadable entries, returning how many were removed
    pub async fn prune_expired(&self) -> TrellisResult<usize> {
        let mut removed = 0;
        for path in self.entry_files().await? {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| TrellisError::io(format!("reading {}", path.display()), e))?;
            let stale = match serde_json::from_str::<FileEntry>(&content) {
                Ok(entry) => entry.is_expired(),
                Err(_) => true,
            };
            if stale {
                debug!("Pruning cache entry {}", path.display());
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| TrellisError::io(format!("removing {}", path.display()), e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn entry_files(&self) -> TrellisResult<Vec<PathBuf>> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TrellisError::io(
                    format!("reading cache directory {}", self.dir.display()),
                    e,
                ))
            }
        };

        let mut files = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| TrellisError::io("reading cache directory entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl FragmentCache for FileStore {
    fn fetch_or_store(
        &self,
        key: &CacheKey,
        options: &CacheOptions,
        compute: Compute<'_>,
    ) -> TrellisResult<String> {
        let storage_key = self.expander.expand(key, options);
        let path = self.entry_path(&storage_key);

        match self.read_entry(&path)? {
            Some(entry) if entry.key == storage_key && !entry.is_expired() => {
                debug!("Cache hit: {}", storage_key);
                self.stats.record_hit();
                return Ok(entry.content);
            }
            Some(entry) if entry.is_expired() => debug!("Cache entry expired: {}", storage_key),
            _ => debug!("Cache miss: {}", storage_key),
        }
        self.stats.record_miss();

        let content = compute()?;
        let now = Utc::now();
        let entry = FileEntry {
            key: storage_key,
            content,
            created_at: now,
            expires_at: self.ttl.map(|ttl| now + ttl),
        };
        self.write_entry(&path, &entry)?;
        self.stats.record_write();
        Ok(entry.content)
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}
