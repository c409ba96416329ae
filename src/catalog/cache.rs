//! Process-wide catalog cache
//!
//! Catalogs are keyed by file path and remembered together with the file's
//! modification time. A lookup whose mtime still matches returns the shared
//! snapshot; otherwise the file is re-read and the new snapshot replaces the
//! old one whole. Readers keep whatever `Arc<Catalog>` they already hold.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::SystemTime;
use tracing::debug;

use super::loader::{self, Catalog};
use crate::error::DataSourceError;

struct CachedCatalog {
    modified: Option<SystemTime>,
    catalog: Arc<Catalog>,
}

/// Loaded catalogs, keyed by path
#[derive(Default)]
pub struct CatalogCache {
    entries: Mutex<HashMap<PathBuf, CachedCatalog>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by the whole process
    pub fn global() -> &'static CatalogCache {
        static CACHE: OnceLock<CatalogCache> = OnceLock::new();
        CACHE.get_or_init(CatalogCache::new)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, CachedCatalog>> {
        // Entries are only ever inserted or removed whole
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get the catalog for `path`, re-reading it if the file changed
    ///
    /// # Errors
    /// Returns `DataSourceError` if the file is missing or cannot be loaded.
    /// A failed reload leaves any previously cached snapshot in place.
    pub fn get(&self, path: &Path) -> Result<Arc<Catalog>, DataSourceError> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DataSourceError::NotFound(path.to_path_buf()),
            _ => DataSourceError::Io(e),
        })?;
        let modified = metadata.modified().ok();

        if let Some(entry) = self.entries().get(path) {
            if modified.is_some() && entry.modified == modified {
                debug!("Catalog cache hit: {}", path.display());
                return Ok(Arc::clone(&entry.catalog));
            }
        }

        // Load outside the lock; other readers keep using the old snapshot
        let catalog = Arc::new(loader::load(path)?);
        self.entries().insert(
            path.to_path_buf(),
            CachedCatalog {
                modified,
                catalog: Arc::clone(&catalog),
            },
        );
        Ok(catalog)
    }

    /// Forget the cached catalog for `path`
    pub fn invalidate(&self, path: &Path) {
        if self.entries().remove(path).is_some() {
            debug!("Catalog cache invalidated: {}", path.display());
        }
    }

    /// Forget every cached catalog
    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let paths: Vec<PathBuf> = self.entries().keys().cloned().collect();
        f.debug_struct("CatalogCache")
            .field("paths", &paths)
            .finish()
    }
}
