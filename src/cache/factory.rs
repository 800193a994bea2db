//! Store factory for building the configured fragment cache

use crate::cache::file::FileStore;
use crate::cache::key::KeyExpander;
use crate::cache::store::{FragmentCache, MemoryStore, NullStore};
use crate::config::schema::{CacheConfig, StoreKind};
use std::sync::Arc;
use tracing::debug;

/// Create the fragment cache described by `config`
///
/// Returns `None` when caching is disabled, so widgets render uncached.
pub fn create_store(config: &CacheConfig) -> Option<Arc<dyn FragmentCache>> {
    if !config.enabled {
        debug!("Fragment caching disabled");
        return None;
    }

    let expander = KeyExpander::new(config.namespace.clone());
    let store: Arc<dyn FragmentCache> = match config.store {
        StoreKind::Memory => Arc::new(MemoryStore::with_expander(expander)),
        StoreKind::Null => Arc::new(NullStore::new()),
        StoreKind::File => {
            let dir = config.fragments_dir();
            debug!("Using file store at {}", dir.display());
            Arc::new(FileStore::with_expander(dir, expander).with_ttl(config.ttl()))
        }
    };

    debug!("Created {} fragment store", store.store_name());
    Some(store)
}
