//! WebSocket listener for hot reload clients.
//!
//! Runs on its own port next to the HTTP server. An acceptor thread
//! handshakes connections on [`RELOAD_PATH`] and hands them to the
//! [`ReloadRegistry`]; a reaper thread drops closed sockets.

use std::{
    io::ErrorKind,
    net::{IpAddr, SocketAddr, TcpListener, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use tungstenite::{
    handshake::server::{ErrorResponse, Request, Response},
    http::StatusCode,
};

use super::ReloadRegistry;
use crate::{debug, log};

/// Path the browser client connects to.
pub const RELOAD_PATH: &str = "/ws";

/// Maximum number of ports to try if the preferred one is busy.
const MAX_PORT_RETRIES: u16 = 10;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on a client's handshake, so a silent peer can't stall accepts.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Running reload listener. Stops when [`ReloadServer::stop`] is called.
pub struct ReloadServer {
    addr: SocketAddr,
    registry: Arc<ReloadRegistry>,
    stop: Arc<AtomicBool>,
}

impl ReloadServer {
    /// Bind at `port` (or the next free one) and start accepting.
    /// Port `0` picks any free port.
    pub fn start(interface: IpAddr, port: u16, registry: Arc<ReloadRegistry>) -> Result<Self> {
        let listener = try_bind_port(interface, port)?;
        listener
            .set_nonblocking(true)
            .context("Failed to set reload listener non-blocking")?;
        let addr = listener.local_addr()?;

        if port != 0 && addr.port() != port {
            log!("ws"; "port {} in use, using {}", port, addr.port());
        }

        let stop = Arc::new(AtomicBool::new(false));

        {
            let registry = Arc::clone(&registry);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("reload-accept".into())
                .spawn(move || accept_loop(listener, &registry, &stop))?;
        }
        {
            let registry = Arc::clone(&registry);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("reload-reap".into())
                .spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        thread::sleep(POLL_INTERVAL);
                        registry.reap();
                    }
                })?;
        }

        debug!("ws"; "listening on ws://{}{}", addr, RELOAD_PATH);
        Ok(Self {
            addr,
            registry,
            stop,
        })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn registry(&self) -> &Arc<ReloadRegistry> {
        &self.registry
    }

    /// Stop accepting and close every client.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        self.registry.close_all();
    }
}

impl Drop for ReloadServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Try to bind to `port`, trying the next ports if busy.
fn try_bind_port(interface: IpAddr, base_port: u16) -> Result<TcpListener> {
    if base_port == 0 {
        return TcpListener::bind((interface, 0)).context("Failed to bind reload listener");
    }

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((interface, port)) {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == ErrorKind::AddrInUse => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to bind reload port {port}"));
            }
        }
    }

    Err(anyhow!(
        "No available reload port in range {}-{}",
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1)
    ))
}

fn accept_loop(listener: TcpListener, registry: &ReloadRegistry, stop: &AtomicBool) {
    while !stop.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = handshake(stream, registry) {
                    debug!("ws"; "rejected {}: {}", peer, e);
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                debug!("ws"; "accept error: {}", e);
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
    debug!("ws"; "acceptor stopped");
}

fn handshake(stream: TcpStream, registry: &ReloadRegistry) -> Result<()> {
    // accepted sockets may inherit the listener's non-blocking flag
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;

    let ws = tungstenite::accept_hdr(stream, check_path)
        .map_err(|e| anyhow!("handshake failed: {e}"))?;

    let stream = ws.get_ref();
    stream.set_read_timeout(None)?;
    stream.set_nonblocking(true)?;

    registry.add(ws);
    Ok(())
}

fn check_path(req: &Request, resp: Response) -> Result<Response, ErrorResponse> {
    if req.uri().path() == RELOAD_PATH {
        return Ok(resp);
    }
    let mut err = ErrorResponse::new(Some(format!("expected {RELOAD_PATH}")));
    *err.status_mut() = StatusCode::NOT_FOUND;
    Err(err)
}
