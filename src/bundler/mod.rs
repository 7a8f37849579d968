//! Page bundling.
//!
//! Every page gets two bundles built from synthetic entries:
//!
//! - server: `<key>.ssr.js`, an IIFE defining `globalThis.renderPage`
//! - client: `<key>.js` (+ `<key>.css`), hydrating `#page`
//!
//! # Module Structure
//!
//! ```text
//! bundler/
//! ├── entry      # synthetic entry modules
//! ├── polyfill   # banner for the embedded engine
//! ├── hint       # esbuild output → one-line hints
//! ├── esbuild    # EsbuildBundler: one-shot and watch builds
//! └── tailwind/  # CLI download and stylesheet compilation
//! ```

mod entry;
mod esbuild;
mod hint;
mod polyfill;
pub mod tailwind;
#[cfg(test)]
pub(crate) mod testing;

pub use entry::{Entries, client_entry, import_specifier, server_entry, write_entries};
pub use esbuild::{EsbuildBundler, Side};
pub use hint::{build_error_hint, format_build_errors, parse_esbuild_errors, truncate};
pub use polyfill::banner;

use std::{io, path::PathBuf, process::Child, sync::Arc};

use thiserror::Error;

use crate::page::Page;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("server bundle error: {hint}")]
    Server { hint: String, detail: String },

    #[error("client bundle error: {hint}")]
    Client { hint: String, detail: String },

    #[error("tailwind error: {0}")]
    Tailwind(String),

    #[error("failed to write `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to run `{program}`: {message}")]
    Spawn { program: String, message: String },
}

impl BuildError {
    /// Full bundler output when it was condensed into a hint.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Server { detail, .. } | Self::Client { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

/// Produces the artifacts of a page at its cache keys.
pub trait Bundler: Send + Sync {
    /// Fetch tools the given pages will need. Called once before bulk builds.
    fn prepare(&self, _pages: &[Arc<Page>]) -> Result<(), BuildError> {
        Ok(())
    }

    /// Build both bundles of `page`, blocking until done.
    fn build(&self, page: &Page) -> Result<(), BuildError>;

    /// Start incremental rebuilds of `page`. The caller owns the children.
    fn watch(&self, _page: &Page) -> Result<Vec<Child>, BuildError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_and_detail() {
        let err = BuildError::Client {
            hint: "Module import error: Check npm dependencies".into(),
            detail: "Module not found: react-dom".into(),
        };
        assert_eq!(
            err.to_string(),
            "client bundle error: Module import error: Check npm dependencies"
        );
        assert_eq!(err.detail(), Some("Module not found: react-dom"));
        assert_eq!(BuildError::Tailwind("x".into()).detail(), None);
    }
}
