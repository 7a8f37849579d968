//! Bundle cache: artifact keys, the cache directory, and bundle reads.
//!
//! # Module Structure
//!
//! ```text
//! cache/
//! ├── key      # page file → artifact path
//! ├── dir      # clean_cache, parent dirs
//! ├── store    # BundleSource: filesystem or embedded snapshot
//! └── bundle   # BundleCache: concurrent get-on-miss map with clear
//! ```

mod bundle;
mod dir;
mod key;
mod store;

pub use bundle::BundleCache;
pub use dir::{FAVICON_FILE, KEEP_FILE, clean_cache, ensure_parent};
pub use key::{Artifact, artifact_key, asset_url, cache_key};
pub use store::{BundleSource, EmbeddedStore, FsStore, StoreError};

/// Short content hash for cache-busting query strings.
pub fn short_hash(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    hex::encode(&hash.as_bytes()[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        let a = short_hash(b"bundle v1");
        assert_eq!(a.len(), 12);
        assert_eq!(a, short_hash(b"bundle v1"));
        assert_ne!(a, short_hash(b"bundle v2"));
    }
}
