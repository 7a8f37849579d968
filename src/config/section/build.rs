//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! pages = "pages"            # Page components (file-system routing root)
//! cache = ".cache"           # Bundle output, mirrors the pages tree
//! tools = ".kiln"            # Synthetic entries and downloaded binaries
//! esbuild = ["esbuild"]      # or ["npx", "esbuild"]
//! target = "es2020"
//! # minify = true            # default: on in production only
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bundling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Pages directory, relative to the project root.
    pub pages: PathBuf,

    /// Cache directory, relative to the project root.
    pub cache: PathBuf,

    /// Tooling directory for generated entries and the Tailwind binary.
    pub tools: PathBuf,

    /// esbuild command.
    pub esbuild: Vec<String>,

    /// esbuild `--target`.
    pub target: String,

    /// Minify bundles. Unset means "minify in production".
    pub minify: Option<bool>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            pages: "pages".into(),
            cache: ".cache".into(),
            tools: ".kiln".into(),
            esbuild: vec!["esbuild".into()],
            target: "es2020".into(),
            minify: None,
        }
    }
}
