//! Post-processing of bundled stylesheets.
//!
//! esbuild writes `<key>.css` with `@import "tailwindcss"` left in place. The
//! raw bundle is stashed in the tools directory and compiled by Tailwind, and
//! the result replaces `<key>.css` through a `.tmp.` file and a rename.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use super::{DIRECTIVE, Tailwind};
use crate::{
    bundler::BuildError,
    utils::exec::{Cmd, OutputFilter},
};

/// What happened to a stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssOutcome {
    /// No stylesheet for this page.
    Missing,
    /// Plain CSS, left untouched.
    Passthrough,
    /// Already processed, nothing to do.
    Unchanged,
    /// Compiled output reused from an earlier run.
    Reused,
    /// Compiled by Tailwind.
    Compiled,
}

/// Paths involved in processing one `<key>.css`.
#[derive(Debug, Clone)]
pub struct CssPaths {
    /// `<root>/<cache>/.../<name>.css`
    pub target: PathBuf,
    /// Raw esbuild output: `<tools>/css/.../<name>.src.css`
    pub stash: PathBuf,
    /// Tailwind output: `<tools>/css/.../<name>.out.css`
    pub compiled: PathBuf,
}

impl CssPaths {
    /// `key` is the stylesheet cache key, relative to `root`.
    pub fn new(root: &Path, tools_dir: &Path, key: &Path) -> Self {
        let stem = key.with_extension("");
        let under_tools = |suffix: &str| {
            let mut name = stem.as_os_str().to_owned();
            name.push(suffix);
            tools_dir.join("css").join(PathBuf::from(name))
        };
        Self {
            target: root.join(key),
            stash: under_tools(".src.css"),
            compiled: under_tools(".out.css"),
        }
    }

    /// Sibling temp file the cache watcher ignores.
    fn temp(&self) -> PathBuf {
        self.target.with_extension("tmp.css")
    }
}

impl Tailwind {
    /// Compile `<key>.css` if it uses Tailwind.
    pub fn process(&self, paths: &CssPaths) -> Result<CssOutcome, BuildError> {
        let current = match fs::read_to_string(&paths.target) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CssOutcome::Missing),
            Err(source) => {
                return Err(BuildError::Io {
                    path: paths.target.clone(),
                    source,
                });
            }
        };

        if current.contains(DIRECTIVE) {
            write_if_changed(&paths.stash, &current)?;
        } else if !is_ours(paths, &current) {
            return Ok(CssOutcome::Passthrough);
        } else if self.cache {
            return Ok(CssOutcome::Unchanged);
        }
        // Otherwise recompile from the stash: classes used by components may
        // have changed even though esbuild left the stylesheet alone.

        if self.cache && is_fresh(&paths.compiled, &paths.stash) {
            install(paths)?;
            return Ok(CssOutcome::Reused);
        }

        self.compile(&paths.stash, &paths.compiled)?;
        install(paths)?;
        Ok(CssOutcome::Compiled)
    }

    /// `tailwindcss -i <input> -o <output> [--minify]`, run from the project root.
    fn compile(&self, input: &Path, output: &Path) -> Result<(), BuildError> {
        let command = self.command()?;
        crate::cache::ensure_parent(output).map_err(|source| BuildError::Io {
            path: output.to_path_buf(),
            source,
        })?;

        Cmd::from_slice(&command)
            .arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output)
            .arg(if self.minify { "--minify" } else { "" })
            .cwd(&self.root)
            .filter(&TAILWIND_FILTER)
            .run()
            .map_err(|e| BuildError::Tailwind(format!("{}: {e:#}", input.display())))?;
        Ok(())
    }
}

/// Progress lines the Tailwind CLI prints on every run.
const TAILWIND_FILTER: OutputFilter = OutputFilter::new(&["≈ tailwindcss", "Done in"]);

/// Whether `current` is the last compiled output.
fn is_ours(paths: &CssPaths, current: &str) -> bool {
    fs::read_to_string(&paths.compiled).is_ok_and(|compiled| compiled == current)
}

/// `output` exists and is at least as new as `input`.
fn is_fresh(output: &Path, input: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(output), modified(input)) {
        (Some(out), Some(inp)) => out >= inp,
        _ => false,
    }
}

/// Copy the compiled output over the target.
fn install(paths: &CssPaths) -> Result<(), BuildError> {
    let temp = paths.temp();
    fs::copy(&paths.compiled, &temp)
        .and_then(|_| fs::rename(&temp, &paths.target))
        .map_err(|source| BuildError::Io {
            path: paths.target.clone(),
            source,
        })
}

fn write_if_changed(path: &Path, content: &str) -> Result<(), BuildError> {
    if fs::read_to_string(path).is_ok_and(|old| old == content) {
        return Ok(());
    }
    crate::cache::ensure_parent(path)
        .and_then(|()| fs::write(path, content))
        .map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })
}
