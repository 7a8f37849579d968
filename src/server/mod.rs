//! HTTP listener.
//!
//! Converts each tiny_http request into a [`RequestContext`] and hands it to
//! [`Engine::handle`] on a small worker pool, so a slow render never blocks
//! accepting connections.
//!
//! [`RequestContext`]: crate::page::RequestContext

pub mod assets;
mod request;
mod response;

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow};
use crossbeam::channel::Sender;
use tiny_http::{Request, Server};

use crate::{core::register_server, engine::Engine, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

const WORKER_THREADS: usize = 4;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = String::new();

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let addr = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, addr));
            }
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error
    ))
}

/// Bind, register for Ctrl+C and serve until shutdown (blocking).
pub fn serve(
    engine: Arc<Engine>,
    interface: IpAddr,
    port: u16,
    shutdown_tx: Sender<()>,
) -> Result<()> {
    let (server, addr) = bind_with_retry(interface, port)?;
    let server = Arc::new(server);
    register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);
    run_request_loop(&server, &engine)
}

fn run_request_loop(server: &Server, engine: &Arc<Engine>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(WORKER_THREADS)
        .thread_name(|i| format!("http-{i}"))
        .build()
        .context("Failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let engine = Arc::clone(engine);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &engine) {
                log!("serve"; "request error: {e:#}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request.
fn handle_request(mut request: Request, engine: &Engine) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let ctx = match request::to_context(&mut request) {
        Ok(ctx) => ctx,
        Err(e) => return response::respond_bad_request(request, &format!("{e:#}")),
    };

    let resp = engine.handle(&ctx);
    crate::debug!("serve"; "{} {} -> {}", ctx.method, ctx.path, resp.status);
    response::send(request, resp)
}
