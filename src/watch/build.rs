//! Per-page incremental builds.
//!
//! Each page owns the bundler's watch children (one per side). They run for
//! the lifetime of the dev server and are killed on removal or shutdown.

use std::{
    path::{Path, PathBuf},
    process::Child,
    sync::Arc,
};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{
    bundler::{BuildError, Bundler},
    debug,
    page::Page,
};

pub struct BuildWatchers {
    bundler: Arc<dyn Bundler>,
    /// Keyed by page file: two routes may share a component.
    children: Mutex<FxHashMap<PathBuf, Vec<Child>>>,
}

impl BuildWatchers {
    pub fn new(bundler: Arc<dyn Bundler>) -> Self {
        Self {
            bundler,
            children: Mutex::new(FxHashMap::default()),
        }
    }

    /// Start watching `page`, replacing any watcher it already had.
    pub fn start(&self, page: &Page) -> Result<(), BuildError> {
        let children = self.bundler.watch(page)?;
        debug!("watch"; "{} build watchers for {}", children.len(), page.file.display());
        let old = self.children.lock().insert(page.file.clone(), children);
        if let Some(old) = old {
            kill(&page.file, old);
        }
        Ok(())
    }

    /// Kill the watchers of `file`. Returns whether it had any.
    pub fn stop(&self, file: &Path) -> bool {
        let removed = self.children.lock().remove(file);
        match removed {
            Some(children) => {
                kill(file, children);
                true
            }
            None => false,
        }
    }

    /// Whether `file` is being watched.
    pub fn contains(&self, file: &Path) -> bool {
        self.children.lock().contains_key(file)
    }

    pub fn len(&self) -> usize {
        self.children.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.lock().is_empty()
    }

    pub fn kill_all(&self) {
        let all = std::mem::take(&mut *self.children.lock());
        for (file, children) in all {
            kill(&file, children);
        }
    }
}

impl Drop for BuildWatchers {
    fn drop(&mut self) {
        self.kill_all();
    }
}

fn kill(file: &Path, children: Vec<Child>) {
    for mut child in children {
        if let Err(e) = child.kill() {
            debug!("watch"; "kill watcher for {}: {}", file.display(), e);
        }
        let _ = child.wait();
    }
}
