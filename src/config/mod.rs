//! Project configuration management for `kiln.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── css        # [css]
//! │   ├── pages      # [pages."<route>"]
//! │   ├── serve      # [serve]
//! │   └── site       # [site]
//! ├── error          # ConfigError
//! ├── util           # config file lookup
//! └── mod.rs         # KilnConfig (this file)
//! ```
//!
//! A missing `kiln.toml` is not an error: every section has defaults, and the
//! project root falls back to `--dir` or the current directory.

pub mod section;
mod error;
mod util;

pub use error::ConfigError;
pub use section::{BuildConfig, CssConfig, PageSection, ServeConfig, SiteConfig};

use crate::{
    cli::{Cli, Commands},
    core::Mode,
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Component, Path, PathBuf},
};
use util::find_config_file;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KilnConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Document defaults
    #[serde(default)]
    pub site: SiteConfig,

    /// Bundling settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Tailwind processing
    #[serde(default)]
    pub css: CssConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Per-route overrides keyed by route pattern
    #[serde(default)]
    pub pages: BTreeMap<String, PageSection>,
}

impl KilnConfig {
    /// Load configuration from CLI arguments.
    ///
    /// With `--dir`, the config is read from that directory. Otherwise the
    /// config file is searched upward from cwd and its parent becomes the root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (root, config_path) = match cli.command.project_dir() {
            Some(dir) => {
                let root = if dir.is_absolute() { dir.to_path_buf() } else { cwd.join(dir) };
                let path = root.join(&cli.config);
                (root, path)
            }
            None => match find_config_file(&cli.config) {
                Some(path) => {
                    let root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                    (root, path)
                }
                None => (cwd.clone(), cwd.join(&cli.config)),
            },
        };

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            crate::debug!("config"; "no {} found, using defaults", cli.config.display());
            Self::default()
        };

        config.config_path = config_path;
        config.root = crate::utils::path::normalize_path(&root);
        config.apply_command_options(cli);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "ignoring unknown fields in {}: {}", display_path, fields.join(", "));
    }

    /// Reject settings no build can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build.esbuild.is_empty() {
            return Err(ConfigError::Validation("[build] esbuild command is empty".into()));
        }
        if self.build.target.trim().is_empty() {
            return Err(ConfigError::Validation("[build] target is empty".into()));
        }
        // cache keys are joined under the root and served under `/<cache>/`
        let cache = &self.build.cache;
        let plain = cache.components().all(|c| matches!(c, Component::Normal(_)));
        if !plain || cache.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!(
                "[build] cache `{}` must be a plain path inside the project root",
                cache.display()
            )));
        }
        if self.build.pages == self.build.cache {
            return Err(ConfigError::Validation(
                "[build] pages and cache must be different directories".into(),
            ));
        }
        for route in self.pages.keys() {
            if !route.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "[pages.\"{route}\"] route patterns must start with '/'"
                )));
            }
        }
        Ok(())
    }

    // ========================================================================
    // paths
    // ========================================================================

    /// Set the project root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Absolute pages directory.
    pub fn pages_dir(&self) -> PathBuf {
        self.root_join(&self.build.pages)
    }

    /// Absolute cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.root_join(&self.build.cache)
    }

    /// Absolute tools directory.
    pub fn tools_dir(&self) -> PathBuf {
        self.root_join(&self.build.tools)
    }

    /// Whether bundles are minified in `mode`.
    pub fn minify(&self, mode: Mode) -> bool {
        self.build.minify.unwrap_or(mode.is_production())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        match &cli.command {
            Commands::Dev {
                interface,
                port,
                ws_port,
                watch,
                ..
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.ws_port, ws_port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
            }
            Commands::Build { output, .. } => {
                if let Some(output) = output {
                    self.build.cache = output.clone();
                }
            }
            Commands::Serve {
                interface, port, ..
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }
}

/// Parse a config string for tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> KilnConfig {
    KilnConfig::from_str(content).unwrap()
}
