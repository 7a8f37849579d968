//! kiln: server-side rendering for React page components.
//!
//! Pages are discovered from a directory tree, bundled twice each with
//! esbuild (a server bundle evaluated in an embedded JS engine, a client
//! bundle for hydration), and rendered per request. In development, watchers
//! rebuild changed pages and reload connected browsers.
//!
//! # Embedding
//!
//! ```ignore
//! use kiln::{engine::Engine, page::{Props, loader}};
//!
//! let engine = Engine::builder(config)
//!     .loader("/users/:id", loader(|req| {
//!         Ok(Props::new(serde_json::json!({ "id": req.param("id") })))
//!     }))
//!     .build()?;
//! let resp = engine.handle(&RequestContext::get("/users/42"));
//! ```

pub mod bundler;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod embed;
pub mod engine;
pub mod logger;
pub mod page;
pub mod reload;
pub mod render;
pub mod server;
pub mod utils;
pub mod watch;

pub use engine::{Engine, EngineBuilder};
