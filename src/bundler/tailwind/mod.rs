//! Tailwind CSS support.
//!
//! - Only stylesheets with `@import "tailwindcss"` are compiled; others pass
//!   through unchanged.
//! - The standalone CLI is downloaded on first use unless `[css] command` is set.
//! - Output is minified with the bundles; compiled output is reused by mtime
//!   when `[css] cache` is on (never in development).

mod download;
mod process;

pub use download::{binary_path, download_url, ensure_binary, platform_asset};
pub use process::{CssOutcome, CssPaths};

use std::{
    fs,
    path::{Path, PathBuf},
};

use super::BuildError;
use crate::{config::KilnConfig, core::Mode, page::Page};

/// Activation directive.
pub const DIRECTIVE: &str = r#"@import "tailwindcss""#;

/// Tailwind settings resolved for one run.
#[derive(Debug, Clone)]
pub struct Tailwind {
    /// Explicit command; empty means the downloaded binary.
    command: Vec<String>,
    tools_dir: PathBuf,
    root: PathBuf,
    minify: bool,
    cache: bool,
}

impl Tailwind {
    pub fn new(config: &KilnConfig, mode: Mode) -> Self {
        Self {
            command: config.css.command.clone(),
            tools_dir: config.tools_dir(),
            root: config.root.clone(),
            minify: config.minify(mode),
            cache: config.css.cache && mode.is_production(),
        }
    }

    /// Command to invoke, downloading the binary when needed.
    fn command(&self) -> Result<Vec<String>, BuildError> {
        if !self.command.is_empty() {
            return Ok(self.command.clone());
        }
        let binary = ensure_binary(&self.tools_dir)?;
        Ok(vec![binary.to_string_lossy().into_owned()])
    }

    /// Download the CLI up front when any stylesheet needs it, so no request
    /// or rebuild ever waits on the network.
    pub fn ensure(&self, pages: &[impl AsRef<Page>]) -> Result<bool, BuildError> {
        if !uses_tailwind(&self.root, pages) {
            return Ok(false);
        }
        self.command()?;
        Ok(true)
    }
}

/// `styles.css` at the project root, or any `.css` next to a page, contains
/// the directive.
pub fn uses_tailwind(root: &Path, pages: &[impl AsRef<Page>]) -> bool {
    if has_directive(&root.join("styles.css")) {
        return true;
    }

    let mut dirs: Vec<PathBuf> = pages
        .iter()
        .filter_map(|p| p.as_ref().file.parent().map(|d| root.join(d)))
        .collect();
    dirs.sort();
    dirs.dedup();

    dirs.iter().any(|dir| {
        fs::read_dir(dir).is_ok_and(|entries| {
            entries.flatten().any(|entry| {
                let path = entry.path();
                path.extension().is_some_and(|e| e == "css") && has_directive(&path)
            })
        })
    })
}

fn has_directive(path: &Path) -> bool {
    fs::read_to_string(path).is_ok_and(|text| text.contains(DIRECTIVE))
}
