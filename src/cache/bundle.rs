//! In-memory bundle cache.
//!
//! Entries are populated on first read and never updated in place. Any
//! artifact change in development clears the whole map.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;

use super::store::{BundleSource, StoreError};

pub struct BundleCache {
    entries: DashMap<PathBuf, Arc<[u8]>>,
    source: Arc<dyn BundleSource>,
}

impl BundleCache {
    pub fn new(source: Arc<dyn BundleSource>) -> Self {
        Self {
            entries: DashMap::new(),
            source,
        }
    }

    /// Bytes at `key`, read from the backing store on a miss.
    pub fn get(&self, key: &Path) -> Result<Arc<[u8]>, StoreError> {
        if let Some(hit) = self.entries.get(key) {
            return Ok(Arc::clone(hit.value()));
        }

        let bytes: Arc<[u8]> = self.source.read(key)?.into();
        // A concurrent miss may have stored first; both read the same bytes.
        let entry = self
            .entries
            .entry(key.to_path_buf())
            .or_insert_with(|| Arc::clone(&bytes));
        Ok(Arc::clone(entry.value()))
    }

    /// `get`, decoded as UTF-8.
    pub fn get_text(&self, key: &Path) -> Result<Arc<str>, StoreError> {
        let bytes = self.get(key)?;
        let text = std::str::from_utf8(&bytes).map_err(|e| {
            StoreError::Io(
                key.to_path_buf(),
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        Ok(Arc::from(text))
    }

    /// Whether `key` exists, in memory or in the backing store.
    pub fn contains(&self, key: &Path) -> bool {
        self.get(key).is_ok()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }
}
