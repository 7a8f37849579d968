//! Cache directory housekeeping.

use std::{fs, io, path::Path};

/// Sentinel that keeps the empty directory tracked by version control.
pub const KEEP_FILE: &str = "keep";

/// Favicon persisted across cleans.
pub const FAVICON_FILE: &str = "favicon.svg";

/// Remove everything in `dir` except the sentinel and the favicon.
///
/// Creates the directory when absent, and writes the default favicon when
/// none exists. Idempotent. Only called before serving or building starts.
pub fn clean_cache(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if name == KEEP_FILE || name == FAVICON_FILE {
                continue;
            }

            let path = entry.path();
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
    }

    fs::create_dir_all(dir)?;

    let favicon = dir.join(FAVICON_FILE);
    if !favicon.exists() {
        fs::write(favicon, crate::embed::FAVICON_SVG)?;
    }
    Ok(())
}

/// Create the parent directory of a cache key.
pub fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_keeps_sentinels() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join(".cache");
        fs::create_dir_all(cache.join("pages/blog")).unwrap();
        fs::write(cache.join(KEEP_FILE), "").unwrap();
        fs::write(cache.join(FAVICON_FILE), "<svg id=\"mine\"/>").unwrap();
        fs::write(cache.join("pages/index.ssr.js"), "x").unwrap();
        fs::write(cache.join("pages/blog/[slug].js"), "x").unwrap();

        clean_cache(&cache).unwrap();

        let mut names: Vec<_> = fs::read_dir(&cache)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![FAVICON_FILE, KEEP_FILE]);
        assert_eq!(
            fs::read_to_string(cache.join(FAVICON_FILE)).unwrap(),
            "<svg id=\"mine\"/>"
        );

        // idempotent
        clean_cache(&cache).unwrap();
        assert!(cache.join(KEEP_FILE).exists());
    }

    #[test]
    fn test_clean_creates_missing_dir() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("nested/.cache");
        clean_cache(&cache).unwrap();
        assert!(cache.is_dir());
        assert!(cache.join(FAVICON_FILE).is_file());
    }

    #[test]
    fn test_ensure_parent() {
        let dir = TempDir::new().unwrap();
        let key = dir.path().join(".cache/pages/users/[id].js");
        ensure_parent(&key).unwrap();
        assert!(key.parent().unwrap().is_dir());
        ensure_parent(Path::new("bare.js")).unwrap();
    }
}
