//! Request-time rendering.
//!
//! ```text
//! props (loader or static) → JSON → server bundle in a fresh engine
//!     → client assets → document
//! ```
//!
//! Every step maps its failure to a [`RenderError`] naming the step. Errors go
//! to the page's error handler when it has one, otherwise to a JSON 500.

mod document;
mod error;
mod js;

pub use document::{Assets, Document};
pub use error::{RenderError, RenderStep, js_error_hint};
pub use js::render_to_string;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    cache::{Artifact, BundleCache, FAVICON_FILE, artifact_key, asset_url},
    embed::serve::{HOTRELOAD_JS, HotreloadVars},
    log,
    page::{HandlerResponse, Page, Props, RequestContext},
};

/// Renders pages against the bundle cache.
pub struct Renderer {
    bundles: Arc<BundleCache>,
    /// Cache directory relative to the project root.
    cache_dir: PathBuf,
    /// Inline hot reload client; set in development only.
    dev_script: Option<String>,
}

impl Renderer {
    pub fn new(bundles: Arc<BundleCache>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            bundles,
            cache_dir: cache_dir.into(),
            dev_script: None,
        }
    }

    /// Inject the hot reload client pointing at `ws_port`.
    pub fn with_hot_reload(mut self, ws_port: u16) -> Self {
        self.dev_script = Some(HOTRELOAD_JS.render(&HotreloadVars { ws_port }));
        self
    }

    /// Render `page` for `req` into a response. Never panics on page errors.
    pub fn respond(&self, page: &Page, req: &RequestContext) -> HandlerResponse {
        match self.render(page, req) {
            Ok(html) => HandlerResponse::html(html),
            Err(err) => {
                log!("render"; "{} ({}): {}", page.route, page.file.display(), err);
                match &page.error_handler {
                    Some(handler) => handler(req, &err, page),
                    None => err.to_response(page),
                }
            }
        }
    }

    /// Run the pipeline. `page` is never modified: per-request props live here.
    pub fn render(&self, page: &Page, req: &RequestContext) -> Result<String, RenderError> {
        let props = resolve_props(page, req)?;

        let props_json = props.to_json().map_err(|e| {
            RenderError::new(
                RenderStep::PropsSerialization,
                "Failed to convert props to JSON",
                e.to_string(),
            )
        })?;

        let bundle = self
            .bundles
            .get_text(&self.key(page, Artifact::Server))
            .map_err(|e| {
                RenderError::new(
                    RenderStep::BundleLoading,
                    "Server bundle not found",
                    format!("Expected files for: {} ({e})", page.file.display()),
                )
            })?;

        let markup = render_to_string(&bundle, &props_json).map_err(|raw| {
            crate::debug!("render"; "{}: {}", page.file.display(), raw);
            RenderError::new(
                RenderStep::ServerRendering,
                "React component rendering failed",
                js_error_hint(&raw),
            )
        })?;

        let assets = self.assets(page)?;

        Document {
            page,
            markup: &markup,
            props_json: &props_json,
            assets: &assets,
            dev_script: self.dev_script.as_deref(),
        }
        .compose()
        .map_err(|e| {
            RenderError::new(
                RenderStep::TemplateExecution,
                "Failed to render HTML",
                e.to_string(),
            )
        })
    }

    fn key(&self, page: &Page, artifact: Artifact) -> PathBuf {
        artifact_key(&self.cache_dir, &page.file, artifact)
    }

    /// Client asset URLs. A missing hydration bundle fails interactive pages.
    fn assets(&self, page: &Page) -> Result<Assets, RenderError> {
        let versioned = |key: &Path| {
            let url = asset_url(key);
            if page.version.is_empty() {
                url
            } else {
                format!("{url}?v={}", page.version)
            }
        };

        let script = if page.interactive {
            let key = self.key(page, Artifact::Client);
            if !self.bundles.contains(&key) {
                return Err(RenderError::new(
                    RenderStep::BundleLoading,
                    "Client bundle files not found",
                    format!("Expected files for: {}", page.file.display()),
                ));
            }
            Some(versioned(&key))
        } else {
            None
        };

        let css_key = self.key(page, Artifact::Style);
        let stylesheet = self
            .bundles
            .contains(&css_key)
            .then(|| versioned(&css_key));

        Ok(Assets {
            favicon: asset_url(&self.cache_dir.join(FAVICON_FILE)),
            stylesheet,
            script,
        })
    }
}

/// Loader result for this request, else the page's static props, else `{}`.
fn resolve_props(page: &Page, req: &RequestContext) -> Result<Props, RenderError> {
    match &page.loader {
        Some(loader) => loader(req).map_err(|e| {
            RenderError::new(RenderStep::LoaderExecution, "Loader failed", format!("{e:#}"))
        }),
        None => Ok(page.props.clone().unwrap_or_else(Props::empty)),
    }
}

#[cfg(test)]
mod tests;
