//! Cache keys: where a page's artifacts live.
//!
//! The bundler writes to these paths and the render path reads from them, so
//! both sides go through [`cache_key`].

use std::path::{Path, PathBuf};

use crate::utils::path::to_url_path;

/// Artifact produced for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// `<key>.ssr.js`, evaluated by the render engine
    Server,
    /// `<key>.js`, the hydration bundle
    Client,
    /// `<key>.css`, stylesheets imported by the page
    Style,
}

impl Artifact {
    pub const ALL: [Self; 3] = [Self::Server, Self::Client, Self::Style];

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Server => "ssr.js",
            Self::Client => "js",
            Self::Style => "css",
        }
    }
}

/// `<cache>/<page file without extension>.<ext>`
///
/// `page_file` is relative to the project root and the result is too.
/// A page file with a multi-dot name keeps everything but its last extension.
pub fn cache_key(cache_dir: &Path, page_file: &Path, extension: &str) -> PathBuf {
    let stem = page_file.with_extension("");
    let mut name = stem.into_os_string();
    name.push(".");
    name.push(extension);
    cache_dir.join(PathBuf::from(name))
}

/// Key of `artifact` for `page_file`.
pub fn artifact_key(cache_dir: &Path, page_file: &Path, artifact: Artifact) -> PathBuf {
    cache_key(cache_dir, page_file, artifact.extension())
}

/// Public URL of a cache key: `/.cache/pages/index.js`.
pub fn asset_url(key: &Path) -> String {
    format!("/{}", to_url_path(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key() {
        let cache = Path::new(".cache");
        assert_eq!(
            cache_key(cache, Path::new("pages/index.tsx"), "ssr.js"),
            PathBuf::from(".cache/pages/index.ssr.js")
        );
        assert_eq!(
            cache_key(cache, Path::new("pages/blog/[slug].tsx"), "css"),
            PathBuf::from(".cache/pages/blog/[slug].css")
        );
        assert_eq!(
            cache_key(cache, Path::new("pages/v1.2/notes.tsx"), "js"),
            PathBuf::from(".cache/pages/v1.2/notes.js")
        );
    }

    #[test]
    fn test_keys_distinct_per_artifact() {
        let cache = Path::new(".cache");
        let file = Path::new("pages/users/[id].tsx");
        let keys: Vec<_> = Artifact::ALL
            .iter()
            .map(|a| artifact_key(cache, file, *a))
            .collect();
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_ne!(keys[0], keys[2]);
        // deterministic
        assert_eq!(keys[0], artifact_key(cache, file, Artifact::Server));
    }

    #[test]
    fn test_asset_url() {
        assert_eq!(
            asset_url(Path::new(".cache/pages/index.js")),
            "/.cache/pages/index.js"
        );
    }
}
