//! Pre-build page checks.
//!
//! Errors abort a bulk build before anything is bundled; warnings are logged
//! and the build continues.

use std::{fs, path::Path};

use super::Page;

/// Extensions esbuild can take as a page entry.
const BUILDABLE_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts", "js"];

/// A page that cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIssue {
    pub route: String,
    pub error: String,
    /// Empty when the page has no file.
    pub file: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<PageIssue>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Multi-line listing of every error.
    pub fn format_errors(&self) -> String {
        let mut out = String::new();
        for (i, issue) in self.errors.iter().enumerate() {
            out.push_str(&format!("{}. route '{}': {}", i + 1, issue.route, issue.error));
            if !issue.file.is_empty() {
                out.push_str(&format!("\n   file: {}", issue.file));
            }
            out.push('\n');
        }
        out
    }
}

/// Check every page file under `root`.
pub fn validate_pages(pages: &[impl AsRef<Page>], root: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();

    for page in pages {
        let page = page.as_ref();
        let file = page.file.display().to_string();
        let mut error = |message: String| {
            report.errors.push(PageIssue {
                route: page.route.clone(),
                error: message,
                file: file.clone(),
            });
        };

        if page.file.as_os_str().is_empty() {
            error("page file path is empty".into());
            continue;
        }

        let path = root.join(&page.file);
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                error(format!("file not found: {e}"));
                continue;
            }
        };

        let ext = page.file.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !BUILDABLE_EXTENSIONS.contains(&ext) {
            error(format!(
                "invalid file extension '.{ext}', expected .tsx, .jsx, .ts or .js"
            ));
            continue;
        }

        if metadata.is_dir() {
            error("path is a directory, not a file".into());
            continue;
        }

        if metadata.len() == 0 {
            report
                .warnings
                .push(format!("page {} ({}) is empty", page.route, file));
            continue;
        }

        let exports = fs::read_to_string(&path)
            .map(|text| text.contains("export"))
            .unwrap_or(true);
        if !exports {
            report
                .warnings
                .push(format!("page {} ({}): no export found", page.route, file));
        }
    }

    report
}

impl AsRef<Page> for Page {
    fn as_ref(&self) -> &Page {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_valid_page() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pages/index.tsx", "export default () => null");
        let report = validate_pages(&[Page::new("/", "pages/index.tsx")], dir.path());
        assert!(report.is_ok());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_errors() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "pages/readme.md", "# hi");
        fs::create_dir_all(root.join("pages/folder.tsx")).unwrap();

        let pages = vec![
            Page::new("/empty", ""),
            Page::new("/missing", "pages/missing.tsx"),
            Page::new("/readme", "pages/readme.md"),
            Page::new("/folder", "pages/folder.tsx"),
        ];
        let report = validate_pages(&pages, root);

        let errors: Vec<_> = report.errors.iter().map(|e| e.error.as_str()).collect();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], "page file path is empty");
        assert!(errors[1].starts_with("file not found"));
        assert!(errors[2].starts_with("invalid file extension '.md'"));
        assert_eq!(errors[3], "path is a directory, not a file");
        assert!(report.format_errors().contains("2. route '/missing'"));
    }

    #[test]
    fn test_warnings() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pages/blank.tsx", "");
        write(dir.path(), "pages/noexp.tsx", "const x = 1;");

        let pages = vec![
            Arc::new(Page::new("/blank", "pages/blank.tsx")),
            Arc::new(Page::new("/noexp", "pages/noexp.tsx")),
        ];
        let report = validate_pages(&pages, dir.path());
        assert!(report.is_ok());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("is empty"));
        assert!(report.warnings[1].contains("no export found"));
    }
}
