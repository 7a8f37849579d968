//! Development server with rebuilds and hot reload.
//!
//! Startup order:
//! 1. clean the cache directory and build every page once
//! 2. start the reload listener, per-page build watchers, cache and pages watchers
//! 3. print the route banner and serve until Ctrl+C

use std::{
    fs,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver};
use owo_colors::OwoColorize;

use super::build::build_pages;
use crate::{
    cache::clean_cache,
    core::Mode,
    engine::{Engine, EngineBuilder},
    log,
    reload::{ReloadRegistry, ReloadServer},
    server,
    watch::{BuildWatchers, DevWatchers},
};

/// `kiln dev`
pub fn run(builder: EngineBuilder) -> Result<()> {
    let config = builder.config().clone();

    let cache_dir = config.cache_dir();
    clean_cache(&cache_dir)
        .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
    let pages_dir = config.pages_dir();
    fs::create_dir_all(&pages_dir)
        .with_context(|| format!("Failed to create pages directory {}", pages_dir.display()))?;

    let registry = Arc::new(ReloadRegistry::new());
    let reload_server = if config.serve.watch {
        Some(ReloadServer::start(
            config.serve.interface,
            config.serve.ws_port,
            Arc::clone(&registry),
        )?)
    } else {
        None
    };

    let mut builder = builder.mode(Mode::Development).registry(registry);
    if let Some(server) = &reload_server {
        builder = builder.hot_reload(server.port());
    }
    let engine = Arc::new(builder.build()?);

    let pages = engine.pages().snapshot();
    engine.bundler().prepare(&pages)?;
    let summary = build_pages(&engine, &pages, true);
    summary.report();
    engine.refresh_versions();

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();

    let watcher_thread = if config.serve.watch {
        let builds = Arc::new(BuildWatchers::new(Arc::clone(engine.bundler())));
        // failed pages are watched too, so fixing the source rebuilds them
        for page in pages.iter() {
            if let Err(e) = builds.start(page) {
                log!("watch"; "{}: {}", page.file.display(), e);
            }
        }
        let watchers = DevWatchers::new(&engine).context("Failed to start file watchers")?;
        Some(spawn_watchers(watchers, Arc::clone(&engine), builds, shutdown_rx)?)
    } else {
        None
    };

    print_banner(&engine);
    let served = server::serve(
        Arc::clone(&engine),
        config.serve.interface,
        config.serve.port,
        shutdown_tx,
    );

    if let Some(server) = reload_server {
        server.stop();
    }
    wait_for_shutdown(watcher_thread);
    served
}

/// Run the watchers on their own runtime until the shutdown channel fires.
fn spawn_watchers(
    watchers: DevWatchers,
    engine: Arc<Engine>,
    builds: Arc<BuildWatchers>,
    shutdown_rx: Receiver<()>,
) -> Result<JoinHandle<()>> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create watcher runtime")?;

    let handle = thread::Builder::new()
        .name("watchers".into())
        .spawn(move || {
            rt.block_on(async move {
                let shutdown = async move {
                    let _ = tokio::task::spawn_blocking(move || shutdown_rx.recv()).await;
                };
                watchers.run(engine, builds, shutdown).await;
            });
            // the blocked shutdown receiver may still be parked
            rt.shutdown_background();
        })?;
    Ok(handle)
}

/// Wait for the watchers to wind down (max 2 seconds).
fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}

fn print_banner(engine: &Engine) {
    let routes = engine.pages().routes();
    log!("serve"; "{} routes ({} mode)", routes.len(), engine.mode().label());
    for route in routes {
        println!("  {}", route.cyan());
    }
    if let Some(port) = engine.ws_port() {
        crate::debug!("serve"; "hot reload on ws://{}:{}/ws", engine.config().serve.interface, port);
    }
}
