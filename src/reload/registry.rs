//! Connected hot reload clients.

use std::{
    io::ErrorKind,
    net::TcpStream,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::{Mutex, RwLock};
use tungstenite::{Error as WsError, Message, WebSocket};

use crate::debug;

/// One browser tab. Each socket is written under its own lock, so a slow
/// client never blocks the registry.
struct Client {
    id: u64,
    ws: Mutex<WebSocket<TcpStream>>,
}

/// Set of open hot reload connections, safe for concurrent use.
#[derive(Default)]
pub struct ReloadRegistry {
    clients: RwLock<Vec<Arc<Client>>>,
    next_id: AtomicU64,
}

impl ReloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handshaken socket. Returns its id.
    pub fn add(&self, ws: WebSocket<TcpStream>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.clients.write().push(Arc::new(Client {
            id,
            ws: Mutex::new(ws),
        }));
        debug!("ws"; "client {} connected ({} total)", id, self.len());
        id
    }

    /// Drop a client. Returns whether it was registered.
    pub fn remove(&self, id: u64) -> bool {
        let mut clients = self.clients.write();
        let before = clients.len();
        clients.retain(|c| c.id != id);
        before != clients.len()
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }

    /// Send `text` to every client, dropping the ones that fail.
    /// Returns how many clients received it.
    pub fn broadcast(&self, text: &str) -> usize {
        let clients = self.clients.read().clone();
        if clients.is_empty() {
            debug!("ws"; "no clients connected");
            return 0;
        }

        let mut failed = Vec::new();
        for client in &clients {
            let mut ws = client.ws.lock();
            match ws.send(Message::text(text)) {
                Ok(()) => {}
                // queued in the write buffer, flushed by a later send or poll
                Err(WsError::Io(e)) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => {
                    debug!("ws"; "client {} disconnected: {}", client.id, e);
                    failed.push(client.id);
                }
            }
        }

        self.drop_clients(&failed);
        let sent = clients.len() - failed.len();
        debug!("ws"; "broadcast {:?} to {} clients", text, sent);
        sent
    }

    /// Poll every socket once and drop closed connections. Incoming
    /// messages are ignored.
    pub fn reap(&self) {
        let clients = self.clients.read().clone();
        let mut closed = Vec::new();

        for client in &clients {
            let mut ws = client.ws.lock();
            loop {
                match ws.read() {
                    Ok(Message::Close(_)) => {
                        closed.push(client.id);
                        break;
                    }
                    Ok(_) => continue,
                    Err(WsError::Io(e)) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(_) => {
                        closed.push(client.id);
                        break;
                    }
                }
            }
        }

        self.drop_clients(&closed);
    }

    /// Close every connection, e.g. on shutdown.
    pub fn close_all(&self) {
        let clients = std::mem::take(&mut *self.clients.write());
        for client in clients {
            let mut ws = client.ws.lock();
            let _ = ws.close(None);
            let _ = ws.flush();
        }
    }

    fn drop_clients(&self, ids: &[u64]) {
        if ids.is_empty() {
            return;
        }
        self.clients.write().retain(|c| !ids.contains(&c.id));
        debug!("ws"; "removed {} clients ({} left)", ids.len(), self.len());
    }
}
