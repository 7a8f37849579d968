//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `to_url_path` - relative path to a `/`-joined URL path
//! - `relative_to` - strip a root prefix, falling back to the input

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Join the normal components of a relative path with `/`.
///
/// Platform separators never leak into URLs or route strings.
///
/// # Example
/// ```ignore
/// assert_eq!(to_url_path(Path::new(".cache/pages/index.js")), ".cache/pages/index.js");
/// ```
pub fn to_url_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Path relative to `root`, or the path unchanged when it lies outside.
pub fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_url_path() {
        assert_eq!(to_url_path(Path::new("pages/blog/[slug].tsx")), "pages/blog/[slug].tsx");
        assert_eq!(to_url_path(Path::new("./.cache/a.js")), ".cache/a.js");
        assert_eq!(to_url_path(Path::new("")), "");
    }

    #[test]
    fn test_relative_to() {
        let root = Path::new("/site");
        assert_eq!(
            relative_to(Path::new("/site/pages/index.tsx"), root),
            PathBuf::from("pages/index.tsx")
        );
        assert_eq!(
            relative_to(Path::new("/other/x.tsx"), root),
            PathBuf::from("/other/x.tsx")
        );
    }

    #[test]
    fn test_normalize_path_absolute_missing() {
        let path = Path::new("/definitely/not/here.tsx");
        assert_eq!(normalize_path(path), path);
    }
}
