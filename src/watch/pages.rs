//! Pages directory watcher: keeps the live route table in step with the tree.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use notify::RecommendedWatcher;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::mpsc;

use super::{
    BuildWatchers,
    debouncer::{ChangeKind, Debouncer},
    watch_dir,
};
use crate::{
    engine::Engine,
    log,
    logger::{status_error, status_success},
    page::{PageDiff, is_page_file},
    reload::RELOAD_MESSAGE,
};

pub struct PagesWatcher {
    rx: mpsc::Receiver<notify::Event>,
    _watcher: RecommendedWatcher,
    debouncer: Debouncer,
}

impl PagesWatcher {
    pub fn new(pages_dir: &Path) -> notify::Result<Self> {
        let (watcher, rx) = watch_dir(pages_dir)?;
        Ok(Self {
            rx,
            _watcher: watcher,
            debouncer: Debouncer::new(),
        })
    }

    pub async fn run(mut self, engine: Arc<Engine>, builds: Arc<BuildWatchers>) {
        loop {
            tokio::select! {
                biased;
                event = self.rx.recv() => match event {
                    Some(event) => self.debouncer.add_event(&event),
                    None => break,
                },
                () = tokio::time::sleep(self.debouncer.sleep_duration()) => {
                    let Some(changes) = self.debouncer.take_if_ready() else {
                        continue;
                    };
                    if !affects_routes(&changes) {
                        continue;
                    }

                    let engine = Arc::clone(&engine);
                    let builds = Arc::clone(&builds);
                    // discovery and builds block
                    let _ = tokio::task::spawn_blocking(move || apply_changes(&engine, &builds)).await;
                }
            }
        }
    }
}

/// Page files or directories appearing or vanishing. Content edits are the
/// build watchers' business.
pub fn affects_routes(changes: &FxHashMap<PathBuf, ChangeKind>) -> bool {
    changes.iter().any(|(path, kind)| {
        *kind != ChangeKind::Modified
            && (is_page_file(path) || path.is_dir() || path.extension().is_none())
    })
}

/// Rescan, log the route diff, build and watch new pages, reload browsers.
pub fn apply_changes(engine: &Engine, builds: &BuildWatchers) -> Option<PageDiff> {
    let before: FxHashSet<PathBuf> = engine
        .pages()
        .snapshot()
        .iter()
        .map(|p| p.file.clone())
        .collect();

    let diff = match engine.rescan() {
        Ok(diff) => diff,
        Err(e) => {
            status_error("page discovery failed", &e.to_string());
            return None;
        }
    };

    for route in &diff.removed {
        log!("watch"; "route removed: {}", route);
    }

    let pages = engine.pages().snapshot();
    let after: FxHashSet<&Path> = pages.iter().map(|p| p.file.as_path()).collect();
    for file in before.iter().filter(|f| !after.contains(f.as_path())) {
        builds.stop(file);
    }

    for page in pages.iter().filter(|p| !before.contains(&p.file)) {
        log!("watch"; "route added: {} ({})", page.route, page.file.display());
        // a broken page is still watched, esbuild rebuilds it once the source is fixed
        if let Err(e) = engine.build_page(page) {
            status_error(&format!("{}: build failed", page.file.display()), &e.to_string());
        }
        if let Err(e) = builds.start(page) {
            status_error(&format!("{}: watch failed", page.file.display()), &e.to_string());
        }
    }

    engine.refresh_versions();
    engine.reload().broadcast(RELOAD_MESSAGE);
    if !diff.is_empty() {
        status_success(&format!(
            "routes updated: +{} -{} ({} total)",
            diff.added.len(),
            diff.removed.len(),
            engine.pages().len()
        ));
    }
    Some(diff)
}
