//! `[css]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [css]
//! enable = true
//! command = ["npx", "@tailwindcss/cli"]   # optional, default: downloaded standalone binary
//! cache = true                           # mtime cache (always off in development)
//! ```

use serde::{Deserialize, Serialize};

/// Tailwind processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CssConfig {
    /// Process stylesheets that use the Tailwind directive.
    pub enable: bool,

    /// Explicit Tailwind command. Empty means the standalone binary in the tools dir.
    pub command: Vec<String>,

    /// Reuse outputs newer than their input.
    pub cache: bool,
}

impl Default for CssConfig {
    fn default() -> Self {
        Self {
            enable: true,
            command: Vec::new(),
            cache: true,
        }
    }
}
