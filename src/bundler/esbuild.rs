//! esbuild driver.
//!
//! One-shot builds run esbuild to completion. Watch mode keeps one
//! `--watch=forever` child per page and side, and a thread per child reads
//! its stderr to report each rebuild.

use std::{
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process::{Child, ChildStderr},
    thread,
};

use super::{
    BuildError, Bundler,
    entry::{Entries, write_entries},
    hint::{build_error_hint, format_build_errors, parse_esbuild_errors},
    polyfill,
    tailwind::{CssOutcome, CssPaths, Tailwind},
};
use crate::{
    cache::{Artifact, artifact_key},
    config::KilnConfig,
    core::Mode,
    debug,
    logger::{status_error, status_success, status_warning},
    page::Page,
    utils::exec::{Cmd, strip_ansi},
};

/// Which bundle of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Server,
    Client,
}

impl Side {
    pub const fn artifact(self) -> Artifact {
        match self {
            Self::Server => Artifact::Server,
            Self::Client => Artifact::Client,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }

    fn error(self, hint: String, detail: String) -> BuildError {
        match self {
            Self::Server => BuildError::Server { hint, detail },
            Self::Client => BuildError::Client { hint, detail },
        }
    }
}

pub struct EsbuildBundler {
    command: Vec<String>,
    root: PathBuf,
    /// Relative to `root`.
    cache: PathBuf,
    tools_dir: PathBuf,
    target: String,
    minify: bool,
    sourcemap: bool,
    tailwind: Option<Tailwind>,
}

impl EsbuildBundler {
    pub fn new(config: &KilnConfig, mode: Mode) -> Self {
        Self {
            command: config.build.esbuild.clone(),
            root: config.root.clone(),
            cache: config.build.cache.clone(),
            tools_dir: config.tools_dir(),
            target: config.build.target.clone(),
            minify: config.minify(mode),
            sourcemap: mode.is_dev(),
            tailwind: config.css.enable.then(|| Tailwind::new(config, mode)),
        }
    }

    fn entries_dir(&self) -> PathBuf {
        self.tools_dir.join("entries")
    }

    /// Absolute output path of `side` for `page`.
    fn outfile(&self, page: &Page, side: Side) -> PathBuf {
        self.root
            .join(artifact_key(&self.cache, &page.file, side.artifact()))
    }

    fn css_paths(&self, page: &Page) -> CssPaths {
        let key = artifact_key(&self.cache, &page.file, Artifact::Style);
        CssPaths::new(&self.root, &self.tools_dir, &key)
    }

    /// Command line (after the esbuild command itself) for one side.
    pub fn args(&self, side: Side, entry: &Path, outfile: &Path) -> Vec<String> {
        let mut args = vec![
            entry.to_string_lossy().into_owned(),
            "--bundle".into(),
            "--platform=browser".into(),
            "--jsx=automatic".into(),
            format!("--target={}", self.target),
            format!("--outfile={}", outfile.to_string_lossy()),
        ];

        match side {
            Side::Server => {
                // the engine evaluates a classic script
                args.push("--format=iife".into());
                args.push("--loader:.css=empty".into());
                args.push(format!("--banner:js={}", polyfill::banner()));
            }
            Side::Client => {
                args.push("--format=esm".into());
                // compiled afterwards by Tailwind
                args.push("--external:tailwindcss".into());
            }
        }

        if self.minify {
            args.push("--minify".into());
        }
        if self.sourcemap {
            args.push("--sourcemap=linked".into());
        }
        args
    }

    fn run(&self, side: Side, entry: &Path, page: &Page) -> Result<(), BuildError> {
        let outfile = self.outfile(page, side);
        let output = Cmd::from_slice(&self.command)
            .args(self.args(side, entry, &outfile))
            .cwd(&self.root)
            .output()
            .map_err(|e| BuildError::Spawn {
                program: self.program(),
                message: format!("{e:#}"),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() {
            debug!("esbuild"; "{} bundle for {}: {}", side.label(), page.file.display(), stderr.trim());
            return Ok(());
        }

        let detail = format_build_errors(&parse_esbuild_errors(&stderr));
        Err(side.error(build_error_hint(&detail), detail))
    }

    fn program(&self) -> String {
        self.command.first().cloned().unwrap_or_default()
    }

    /// Compile the page's stylesheet if it needs Tailwind.
    fn finish_styles(&self, page: &Page) -> Result<CssOutcome, BuildError> {
        match &self.tailwind {
            Some(tailwind) => tailwind.process(&self.css_paths(page)),
            None => Ok(CssOutcome::Passthrough),
        }
    }

    fn spawn_watch(&self, side: Side, entry: &Path, page: &Page) -> Result<Child, BuildError> {
        let outfile = self.outfile(page, side);
        let mut child = Cmd::from_slice(&self.command)
            .args(self.args(side, entry, &outfile))
            .arg("--watch=forever")
            .cwd(&self.root)
            .spawn()
            .map_err(|e| BuildError::Spawn {
                program: self.program(),
                message: format!("{e:#}"),
            })?;

        if let Some(stderr) = child.stderr.take() {
            let monitor = WatchMonitor {
                file: page.file.clone(),
                side,
                styles: match (side, &self.tailwind) {
                    (Side::Client, Some(tw)) => Some((tw.clone(), self.css_paths(page))),
                    _ => None,
                },
            };
            thread::Builder::new()
                .name(format!("esbuild-{}", side.label()))
                .spawn(move || monitor.run(stderr))
                .map_err(|source| BuildError::Io {
                    path: page.file.clone(),
                    source,
                })?;
        }

        Ok(child)
    }

    fn entries(&self, page: &Page) -> Result<Entries, BuildError> {
        write_entries(&self.entries_dir(), &self.root, &page.file)
    }
}

impl Bundler for EsbuildBundler {
    fn prepare(&self, pages: &[std::sync::Arc<Page>]) -> Result<(), BuildError> {
        let program = self.program();
        if which::which(&program).is_err() {
            return Err(BuildError::Spawn {
                program,
                message: "not found in PATH (install esbuild or set `build.esbuild`)".into(),
            });
        }
        if let Some(tailwind) = &self.tailwind {
            tailwind.ensure(pages)?;
        }
        Ok(())
    }

    fn build(&self, page: &Page) -> Result<(), BuildError> {
        let entries = self.entries(page)?;
        self.run(Side::Server, &entries.server, page)?;
        self.run(Side::Client, &entries.client, page)?;
        self.finish_styles(page)?;
        Ok(())
    }

    fn watch(&self, page: &Page) -> Result<Vec<Child>, BuildError> {
        let entries = self.entries(page)?;
        let server = self.spawn_watch(Side::Server, &entries.server, page)?;
        match self.spawn_watch(Side::Client, &entries.client, page) {
            Ok(client) => Ok(vec![server, client]),
            Err(e) => {
                let mut server = server;
                let _ = server.kill();
                Err(e)
            }
        }
    }
}

/// Reads one watch child's stderr for its lifetime.
struct WatchMonitor {
    file: PathBuf,
    side: Side,
    styles: Option<(Tailwind, CssPaths)>,
}

impl WatchMonitor {
    fn run(self, stderr: ChildStderr) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut first = true;

        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            let line = strip_ansi(&line).into_owned();

            if line.contains("[watch] build started") {
                errors.clear();
                warnings.clear();
            } else if let Some((_, message)) = line.split_once("[ERROR]") {
                errors.push(message.trim().to_string());
            } else if let Some((_, message)) = line.split_once("[WARNING]") {
                warnings.push(message.trim().to_string());
            } else if line.contains("[watch] build finished") {
                self.report(&errors, &warnings, first);
                errors.clear();
                warnings.clear();
                first = false;
            }
        }
        debug!("esbuild"; "{} watcher for {} exited", self.side.label(), self.file.display());
    }

    fn report(&self, errors: &[String], warnings: &[String], first: bool) {
        let file = self.file.display();
        if !errors.is_empty() {
            let hint = build_error_hint(&format_build_errors(errors));
            status_error(&format!("{file}: {} bundle error", self.side.label()), &hint);
            return;
        }

        if let Some((tailwind, paths)) = &self.styles
            && let Err(e) = tailwind.process(paths)
        {
            status_error(&format!("{file}: stylesheet error"), &e.to_string());
            return;
        }

        if !warnings.is_empty() {
            status_warning(&format!("{file}: {}", warnings.join("; ")));
        } else if !first {
            // the initial build of a freshly started watcher is not news
            status_success(&format!("rebuilt {} bundle: {file}", self.side.label()));
        }
    }
}
