//! Hot reload over WebSocket.
//!
//! ```text
//! cache watcher / pages watcher ──► ReloadRegistry::broadcast("reload")
//!                                          │
//! browser (hotreload.js) ◄── ws://host:ws_port/ws ◄── ReloadServer
//! ```
//!
//! Clients reload on any message, so the payload is always `"reload"`.

mod registry;
mod server;

pub use registry::ReloadRegistry;
pub use server::{RELOAD_PATH, ReloadServer};

/// The only message ever sent to clients.
pub const RELOAD_MESSAGE: &str = "reload";
