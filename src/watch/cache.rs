//! Cache directory watcher: any artifact change reloads every browser.

use std::{path::Path, sync::Arc};

use notify::{EventKind, RecommendedWatcher, event::ModifyKind};
use tokio::sync::mpsc;

use super::watch_dir;
use crate::{debug, engine::Engine, log};

pub struct CacheWatcher {
    rx: mpsc::Receiver<notify::Event>,
    _watcher: RecommendedWatcher,
}

impl CacheWatcher {
    pub fn new(cache_dir: &Path) -> notify::Result<Self> {
        let (watcher, rx) = watch_dir(cache_dir)?;
        Ok(Self {
            rx,
            _watcher: watcher,
        })
    }

    /// Invalidate on every relevant event. Events already queued behind it
    /// are folded into the same reload; later ones may reload again.
    pub async fn run(mut self, engine: Arc<Engine>) {
        while let Some(event) = self.rx.recv().await {
            if !is_artifact_change(&event) {
                continue;
            }
            while self.rx.try_recv().is_ok() {}

            // version refresh reads bundles from disk
            let engine = Arc::clone(&engine);
            let invalidated = tokio::task::spawn_blocking(move || engine.invalidate()).await;
            match invalidated {
                Ok(clients) => {
                    debug!("watch"; "{:?} changed, reloading {} clients", event.paths, clients);
                }
                Err(e) => log!("watch"; "cache invalidation failed: {}", e),
            }
        }
    }
}

/// Content changes to cache files. Permission and access events, and the
/// temporary files stylesheets are staged through, don't count.
pub fn is_artifact_change(event: &notify::Event) -> bool {
    match event.kind {
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
            event.paths.iter().any(|p| !is_intermediate(p))
        }
        _ => false,
    }
}

fn is_intermediate(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(".tmp.") || n.ends_with(".part"))
}
