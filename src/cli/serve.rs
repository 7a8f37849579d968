//! Production serving of an existing cache.

use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel;

use crate::{core::Mode, engine::EngineBuilder, log, server};

/// `kiln serve`: no watchers, no hot reload script.
///
/// Bundles come from the embedded snapshot when the host registered one,
/// otherwise from the cache directory on disk.
pub fn run(builder: EngineBuilder) -> Result<()> {
    let engine = Arc::new(builder.mode(Mode::Production).build()?);
    let config = engine.config();

    let missing: Vec<_> = engine
        .pages()
        .snapshot()
        .iter()
        .filter(|p| p.version.is_empty())
        .map(|p| p.file.display().to_string())
        .collect();
    if !missing.is_empty() {
        log!("warning"; "no client bundle for {} (run `kiln build` first)", missing.join(", "));
    }

    log!("serve"; "{} routes from {}", engine.pages().len(), engine.bundles().source_name());
    let (shutdown_tx, _shutdown_rx) = channel::unbounded::<()>();
    let (interface, port) = (config.serve.interface, config.serve.port);
    server::serve(Arc::clone(&engine), interface, port, shutdown_tx)
}
