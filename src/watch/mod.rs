//! Development watchers.
//!
//! ```text
//! page sources ──► esbuild --watch (BuildWatchers) ──► cache dir
//!                                                        │
//!                        CacheWatcher ◄──────────────────┘
//!                          clear bundles, refresh versions, broadcast "reload"
//!
//! pages dir ──► PagesWatcher (debounced)
//!                 rescan, build new pages, start their watchers, broadcast
//! ```
//!
//! notify delivers events on its own thread; a bridge thread forwards them
//! into tokio channels so each watcher is a plain async loop.

mod build;
mod cache;
mod debouncer;
mod pages;

pub use build::BuildWatchers;
pub use cache::{CacheWatcher, is_artifact_change};
pub use debouncer::ChangeKind;
pub use pages::PagesWatcher;

use std::{future::Future, path::Path, sync::Arc, thread};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::{engine::Engine, log};

/// Watch `dir` recursively, forwarding events into a tokio channel.
///
/// Directories created later are covered by the recursive watch.
fn watch_dir(dir: &Path) -> notify::Result<(RecommendedWatcher, mpsc::Receiver<notify::Event>)> {
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })?;
    watcher.watch(dir, RecursiveMode::Recursive)?;

    let (tx, rx) = mpsc::channel(64);
    thread::Builder::new()
        .name("notify-bridge".into())
        .spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        })
        .map_err(notify::Error::io)?;

    Ok((watcher, rx))
}

/// The cache and pages watchers of a dev server.
pub struct DevWatchers {
    cache: CacheWatcher,
    pages: PagesWatcher,
}

impl DevWatchers {
    /// Attach both watchers. Fails when a directory can't be watched.
    pub fn new(engine: &Engine) -> notify::Result<Self> {
        let config = engine.config();
        Ok(Self {
            cache: CacheWatcher::new(&config.cache_dir())?,
            pages: PagesWatcher::new(&config.pages_dir())?,
        })
    }

    /// Run until `shutdown` resolves, then kill the build watchers.
    pub async fn run(
        self,
        engine: Arc<Engine>,
        builds: Arc<BuildWatchers>,
        shutdown: impl Future<Output = ()>,
    ) {
        tokio::select! {
            () = self.cache.run(Arc::clone(&engine)) => {}
            () = self.pages.run(Arc::clone(&engine), Arc::clone(&builds)) => {}
            () = shutdown => crate::debug!("watch"; "shutdown requested"),
        }
        builds.kill_all();
    }
}

#[cfg(test)]
mod tests;
