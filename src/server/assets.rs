//! Cache artifacts under `/<cache>/...`.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::{
    cache::{BundleCache, FAVICON_FILE, StoreError},
    embed::FAVICON_SVG,
    page::HandlerResponse,
    utils::{mime, path::to_url_path},
};

/// Answer `path` when it points into the cache directory, `None` otherwise.
///
/// Reads go through the bundle cache, so the same source (filesystem or
/// snapshot) serves documents and assets.
pub fn serve_asset(bundles: &BundleCache, cache: &Path, path: &str) -> Option<HandlerResponse> {
    let prefix = format!("/{}/", to_url_path(cache));
    let rest = path.strip_prefix(&prefix)?;
    let rest = percent_decode_str(rest).decode_utf8_lossy();

    let key = cache.join(PathBuf::from(rest.as_ref()));
    let content_type = mime::from_path(&key);

    Some(match bundles.get(&key) {
        Ok(bytes) => HandlerResponse::new(200, content_type, bytes.to_vec()),
        Err(StoreError::NotFound(_)) if rest == FAVICON_FILE => {
            HandlerResponse::new(200, mime::types::SVG, FAVICON_SVG)
        }
        Err(StoreError::NotFound(_)) => HandlerResponse::text(404, "404 Not Found"),
        Err(StoreError::Forbidden(_)) => HandlerResponse::text(403, "403 Forbidden"),
        Err(e) => {
            crate::log!("serve"; "{}: {}", key.display(), e);
            HandlerResponse::text(500, "500 Internal Server Error")
        }
    })
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use super::*;
    use crate::cache::FsStore;

    fn setup() -> (tempfile::TempDir, BundleCache) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".cache/pages")).unwrap();
        fs::write(dir.path().join(".cache/pages/index.js"), "hydrate()").unwrap();
        fs::write(dir.path().join(".cache/pages/my page.css"), "body{}").unwrap();
        let bundles = BundleCache::new(Arc::new(FsStore::new(dir.path())));
        (dir, bundles)
    }

    #[test]
    fn test_serves_bundle() {
        let (_dir, bundles) = setup();
        let resp = serve_asset(&bundles, Path::new(".cache"), "/.cache/pages/index.js").unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, mime::types::JAVASCRIPT);
        assert_eq!(resp.body_str(), "hydrate()");
    }

    #[test]
    fn test_percent_decoded() {
        let (_dir, bundles) = setup();
        let resp =
            serve_asset(&bundles, Path::new(".cache"), "/.cache/pages/my%20page.css").unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, mime::types::CSS);
    }

    #[test]
    fn test_outside_prefix_ignored() {
        let (_dir, bundles) = setup();
        assert!(serve_asset(&bundles, Path::new(".cache"), "/pages/index.js").is_none());
        assert!(serve_asset(&bundles, Path::new(".cache"), "/.cachex/a.js").is_none());
    }

    #[test]
    fn test_missing_and_traversal() {
        let (_dir, bundles) = setup();
        let cache = Path::new(".cache");
        assert_eq!(serve_asset(&bundles, cache, "/.cache/nope.js").unwrap().status, 404);
        assert_eq!(
            serve_asset(&bundles, cache, "/.cache/../Cargo.toml").unwrap().status,
            403
        );
        assert_eq!(
            serve_asset(&bundles, cache, "/.cache/%2e%2e/secret").unwrap().status,
            403
        );
    }

    #[test]
    fn test_default_favicon() {
        let (_dir, bundles) = setup();
        let resp = serve_asset(&bundles, Path::new(".cache"), "/.cache/favicon.svg").unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, mime::types::SVG);
        assert!(resp.body_str().contains("<svg"));
    }
}
