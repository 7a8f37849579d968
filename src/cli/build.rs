//! Production bulk build.
//!
//! Pipeline:
//! - **Validate** - every page file exists and looks like a component
//! - **Clean** - empty the cache directory
//! - **Prepare** - fetch tools the pages need (Tailwind)
//! - **Bundle** - build every page in parallel; failures are isolated
//! - **Report** - `built X/Y pages`, then each failure

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;

use crate::{
    bundler::BuildError,
    cache::clean_cache,
    core::Mode,
    debug,
    engine::{Engine, EngineBuilder},
    log,
    logger::ProgressLine,
    page::{Page, validate_pages},
};

/// Outcome of building a set of pages.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub total: usize,
    /// Failing page files, in page order.
    pub failures: Vec<(PathBuf, BuildError)>,
}

impl BuildSummary {
    pub fn built(&self) -> usize {
        self.total - self.failures.len()
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Print the counts, then every failing page.
    pub fn report(&self) {
        log!("build"; "built {}/{} pages", self.built(), self.total);
        for (file, err) in &self.failures {
            log!("error"; "{}: {}", file.display(), err);
            if let Some(detail) = err.detail() {
                debug!("build"; "{}", detail);
            }
        }
    }

    /// Any failure fails the build.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            return Ok(());
        }
        bail!(
            "{} of {} pages failed to build",
            self.failures.len(),
            self.total
        )
    }
}

/// Build `pages` in parallel. One page failing never stops the others.
pub fn build_pages(engine: &Engine, pages: &[Arc<Page>], progress: bool) -> BuildSummary {
    let progress = progress.then(|| ProgressLine::new("pages", pages.len()));

    let results: Vec<_> = pages
        .par_iter()
        .map(|page| {
            let result = engine.build_page(page);
            if let Some(p) = &progress {
                p.inc();
            }
            (page.file.clone(), result)
        })
        .collect();

    if let Some(p) = progress {
        p.finish();
    }

    BuildSummary {
        total: pages.len(),
        failures: results
            .into_iter()
            .filter_map(|(file, result)| result.err().map(|e| (file, e)))
            .collect(),
    }
}

/// Validate, clean and bundle every discovered page.
///
/// Validation errors abort before any bundling. Build failures are collected
/// into the summary.
pub fn build_site(engine: &Engine) -> Result<BuildSummary> {
    let config = engine.config();
    let pages = engine.pages().snapshot();

    let report = validate_pages(&pages, &config.root);
    for warning in &report.warnings {
        log!("warning"; "{}", warning);
    }
    if !report.is_ok() {
        bail!("page validation failed:\n{}", report.format_errors());
    }

    let cache_dir = config.cache_dir();
    clean_cache(&cache_dir)
        .with_context(|| format!("Failed to clean cache directory {}", cache_dir.display()))?;

    engine.bundler().prepare(&pages)?;

    log!("build"; "bundling {} pages ({})", pages.len(), engine.mode().label());
    let summary = build_pages(engine, &pages, true);
    engine.refresh_versions();
    Ok(summary)
}

/// `kiln build`
pub fn run(builder: EngineBuilder) -> Result<()> {
    let engine = builder.mode(Mode::Production).build()?;
    let summary = build_site(&engine)?;
    summary.report();
    summary.into_result()
}
