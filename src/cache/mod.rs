//! Fragment caching for widgets
//!
//! Widgets declare which inputs identify their rendered output; the render
//! pipeline turns those inputs into a cache key and asks a pluggable backend
//! to fetch or compute-and-store the fragment.
//!
//! # Backends
//!
//! | Store | Retains | Notes |
//! |-------|---------|-------|
//! | memory | process lifetime | hit/miss counters |
//! | file | on disk | JSON entries, optional expiry |
//! | null | nothing | every fetch computes |
//!
//! The fetch sequence is read, check, then write. Concurrent renders of the
//! same key may both compute; a backend that needs at-most-once computation
//! must provide it itself.

pub mod cacheable;
pub mod factory;
pub mod file;
pub mod key;
pub mod store;

pub use cacheable::{Cacheability, Cacheable, CacheableOptions};
pub use factory::create_store;
pub use file::{FileEntry, FileStore, StoreUsage};
pub use key::{CacheKey, CacheOptions, KeyDigest, KeyExpander, Sha256Digest};
pub use store::{CacheStats, Compute, FragmentCache, MemoryStore, NullStore};
