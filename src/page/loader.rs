//! Per-request callbacks: loaders, API handlers and error handlers.
//!
//! Callbacks are registered by exact route pattern and receive a
//! [`RequestContext`] by reference.

use std::{fmt, sync::Arc};

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::{Page, route::Params};
use crate::render::RenderError;
use crate::utils::mime::types;

// ============================================================================
// props
// ============================================================================

/// Object-safe JSON serialization.
pub trait SerializeJson: Send + Sync {
    fn to_json(&self) -> serde_json::Result<String>;
}

impl<T: Serialize + Send + Sync> SerializeJson for T {
    fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Type-erased render props.
///
/// Serialization is deferred to render time so a value that cannot be
/// represented as JSON surfaces as a `props serialization` failure.
#[derive(Clone)]
pub struct Props(Arc<dyn SerializeJson>);

impl Props {
    pub fn new<T: Serialize + Send + Sync + 'static>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// `{}`
    pub fn empty() -> Self {
        Self::new(serde_json::Map::new())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        self.0.to_json()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => write!(f, "Props({json})"),
            Err(_) => f.write_str("Props(<unserializable>)"),
        }
    }
}

// ============================================================================
// request context
// ============================================================================

/// What a loader or handler sees of the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// Decoded route parameters (`:id` → `"42"`).
    pub params: Params,
    pub query: FxHashMap<String, String>,
    /// Header names are lowercased.
    pub headers: FxHashMap<String, String>,
    /// Raw request body; empty for `GET`.
    pub body: Vec<u8>,
}

impl RequestContext {
    /// A `GET` for `url` (`/path?key=value`), mostly for tests and embedding.
    pub fn get(url: &str) -> Self {
        let (path, query) = split_url(url);
        Self {
            method: "GET".into(),
            path: path.to_string(),
            query: parse_query(query),
            ..Default::default()
        }
    }

    /// A request with an arbitrary method, e.g. `POST` to an API handler.
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            ..Self::get(url)
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Split `/path?query` into its parts.
pub fn split_url(url: &str) -> (&str, &str) {
    let url = url.split('#').next().unwrap_or(url);
    match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    }
}

/// Parse `a=1&b=two%20words`, decoding `+` as a space. Later keys win.
pub fn parse_query(query: &str) -> FxHashMap<String, String> {
    use percent_encoding::percent_decode_str;

    let decode = |s: &str| {
        let s = s.replace('+', " ");
        percent_decode_str(&s).decode_utf8_lossy().into_owned()
    };

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode(k), decode(v)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

// ============================================================================
// callbacks
// ============================================================================

/// Produces render props for one request. An error short-circuits rendering.
pub type Loader = Arc<dyn Fn(&RequestContext) -> anyhow::Result<Props> + Send + Sync>;

/// API handler registered next to the pages.
pub type Handler = Arc<dyn Fn(&RequestContext) -> anyhow::Result<HandlerResponse> + Send + Sync>;

/// Replaces the default JSON 500 for a failed render.
pub type ErrorHandler =
    Arc<dyn Fn(&RequestContext, &RenderError, &Page) -> HandlerResponse + Send + Sync>;

/// Loaders keyed by exact route pattern.
pub type Loaders = FxHashMap<String, Loader>;

/// Wrap a closure as a [`Loader`].
pub fn loader<F>(f: F) -> Loader
where
    F: Fn(&RequestContext) -> anyhow::Result<Props> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&RequestContext) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Response produced by handlers, error handlers and the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl HandlerResponse {
    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self::new(200, types::HTML, body.into())
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, types::PLAIN, body.into())
    }

    /// Serialize `value` as a JSON body.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, types::JSON, body),
            Err(e) => Self::text(500, format!("failed to serialize response: {e}")),
        }
    }

    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
