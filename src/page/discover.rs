//! Page discovery.
//!
//! Walks the pages directory and maps every component file to a route.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use thiserror::Error;

use super::{Loaders, Page, route::route_from_file};
use crate::utils::path::relative_to;

/// Extensions recognized as page components.
pub const PAGE_EXTENSIONS: &[&str] = &["tsx", "jsx"];

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("pages path `{0}` is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to walk `{path}`: {message}")]
    Walk { path: PathBuf, message: String },
}

/// Whether `path` names a page component.
pub fn is_page_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));

    !hidden
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| PAGE_EXTENSIONS.contains(&e))
}

/// Discover pages under `pages_dir`, sorted by route.
///
/// A missing directory yields no pages. `file` on each page is relative to
/// `root`. Loaders are attached by exact route.
pub fn discover_pages(
    pages_dir: &Path,
    root: &Path,
    loaders: &Loaders,
) -> Result<Vec<Page>, DiscoveryError> {
    if !pages_dir.exists() {
        crate::debug!("discover"; "{} does not exist, no pages", pages_dir.display());
        return Ok(Vec::new());
    }
    if !pages_dir.is_dir() {
        return Err(DiscoveryError::NotADirectory(pages_dir.to_path_buf()));
    }

    let mut pages = Vec::new();
    for entry in WalkDir::new(pages_dir).sort(true) {
        let entry = entry.map_err(|e| DiscoveryError::Walk {
            path: pages_dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let path = entry.path();
        if !entry.file_type().is_file() || !is_page_file(&path) {
            continue;
        }

        let route = route_from_file(&relative_to(&path, pages_dir));
        let mut page = Page::new(route, relative_to(&path, root));
        page.loader = loaders.get(&page.route).cloned();
        pages.push(page);
    }

    pages.sort_by(|a, b| a.route.cmp(&b.route));
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Props, loader};
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export default function Page() { return null }").unwrap();
    }

    #[test]
    fn test_discover_routes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "pages/index.tsx");
        touch(root, "pages/about.jsx");
        touch(root, "pages/users/[id].tsx");
        touch(root, "pages/styles.css");
        touch(root, "pages/.draft.tsx");
        touch(root, "pages/util.ts");

        let pages = discover_pages(&root.join("pages"), root, &Loaders::default()).unwrap();
        let routes: Vec<_> = pages.iter().map(|p| p.route.as_str()).collect();
        assert_eq!(routes, vec!["/", "/about", "/users/:id"]);

        let user = &pages[2];
        assert_eq!(user.file, PathBuf::from("pages/users/[id].tsx"));
        assert!(user.interactive);
        assert!(user.loader.is_none());
    }

    #[test]
    fn test_loader_attached_by_exact_route() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "pages/users/[id].tsx");
        touch(root, "pages/index.tsx");

        let mut loaders = Loaders::default();
        loaders.insert("/users/:id".into(), loader(|_| Ok(Props::empty())));
        loaders.insert("/users/[id]".into(), loader(|_| Ok(Props::empty())));

        let pages = discover_pages(&root.join("pages"), root, &loaders).unwrap();
        assert!(pages.iter().find(|p| p.route == "/users/:id").unwrap().loader.is_some());
        assert!(pages.iter().find(|p| p.route == "/").unwrap().loader.is_none());
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let pages = discover_pages(&dir.path().join("nope"), dir.path(), &Loaders::default());
        assert!(pages.unwrap().is_empty());
    }

    #[test]
    fn test_file_as_pages_dir() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "pages");
        let err = discover_pages(&dir.path().join("pages"), dir.path(), &Loaders::default());
        assert!(matches!(err, Err(DiscoveryError::NotADirectory(_))));
    }

    #[test]
    fn test_is_page_file() {
        assert!(is_page_file(Path::new("pages/a.tsx")));
        assert!(!is_page_file(Path::new("pages/a.css")));
        assert!(!is_page_file(Path::new("pages/.a.tsx")));
    }
}
