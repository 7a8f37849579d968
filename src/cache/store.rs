//! Backing stores for cached artifacts.
//!
//! Development reads the live filesystem; production can read a snapshot of
//! the cache directory embedded into the binary with `include_dir!`.

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use include_dir::Dir;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("`{0}` not found")]
    NotFound(PathBuf),

    #[error("failed to read `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("`{0}` escapes the cache directory")]
    Forbidden(PathBuf),
}

/// Where artifact bytes come from.
pub trait BundleSource: Send + Sync {
    /// Read the artifact at `key` (relative to the project root).
    fn read(&self, key: &Path) -> Result<Vec<u8>, StoreError>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

/// Keys must be plain relative paths.
fn check_key(key: &Path) -> Result<(), StoreError> {
    let plain = key
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if plain {
        Ok(())
    } else {
        Err(StoreError::Forbidden(key.to_path_buf()))
    }
}

/// Live filesystem under the project root.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BundleSource for FsStore {
    fn read(&self, key: &Path) -> Result<Vec<u8>, StoreError> {
        check_key(key)?;
        let path = self.root.join(key);
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(key.to_path_buf()),
            _ => StoreError::Io(key.to_path_buf(), e),
        })
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}

/// Read-only snapshot of the cache directory.
///
/// The snapshot's paths are relative to the cache directory itself, so the
/// cache prefix is stripped from incoming keys.
pub struct EmbeddedStore {
    dir: &'static Dir<'static>,
    prefix: PathBuf,
}

impl EmbeddedStore {
    pub fn new(dir: &'static Dir<'static>, cache_prefix: impl Into<PathBuf>) -> Self {
        Self {
            dir,
            prefix: cache_prefix.into(),
        }
    }
}

impl BundleSource for EmbeddedStore {
    fn read(&self, key: &Path) -> Result<Vec<u8>, StoreError> {
        check_key(key)?;
        let inner = key
            .strip_prefix(&self.prefix)
            .map_err(|_| StoreError::NotFound(key.to_path_buf()))?;
        self.dir
            .get_file(inner)
            .map(|f| f.contents().to_vec())
            .ok_or_else(|| StoreError::NotFound(key.to_path_buf()))
    }

    fn name(&self) -> &'static str {
        "embedded"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use include_dir::include_dir;
    use tempfile::TempDir;

    static SNAPSHOT: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/src/cache/fixtures/snapshot");

    #[test]
    fn test_fs_store() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".cache/pages")).unwrap();
        fs::write(dir.path().join(".cache/pages/index.js"), "hydrate()").unwrap();

        let store = FsStore::new(dir.path());
        assert_eq!(store.read(Path::new(".cache/pages/index.js")).unwrap(), b"hydrate()");
        assert!(matches!(
            store.read(Path::new(".cache/pages/missing.js")),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.read(Path::new(".cache/../secret")),
            Err(StoreError::Forbidden(_))
        ));
    }

    #[test]
    fn test_embedded_store() {
        let store = EmbeddedStore::new(&SNAPSHOT, ".cache");
        let bytes = store.read(Path::new(".cache/pages/index.ssr.js")).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("renderPage"));

        assert!(matches!(
            store.read(Path::new("other/pages/index.ssr.js")),
            Err(StoreError::NotFound(_))
        ));
        assert!(store.read(Path::new(".cache/pages/nope.js")).is_err());
        assert_eq!(store.name(), "embedded");
    }
}
