//! The engine: one explicit context instead of process-wide registries.
//!
//! ```text
//! EngineBuilder ── config, mode, loaders, handlers, hooks, store, bundler
//!      │ build()
//!      ▼
//! Engine ── PageTable ◄── rescan (pages watcher)
//!   │        BundleCache ◄── clear (cache watcher)
//!   │        ReloadRegistry ◄── broadcast
//!   └─ handle(RequestContext) → assets | API handler | page render | 404
//! ```
//!
//! Everything a request or a watcher needs is reached through `Arc<Engine>`.

use std::sync::Arc;

use include_dir::Dir;
use serde_json::json;

use crate::{
    bundler::{BuildError, Bundler, EsbuildBundler},
    cache::{
        Artifact, BundleCache, BundleSource, EmbeddedStore, FsStore, artifact_key, short_hash,
    },
    config::KilnConfig,
    core::Mode,
    debug,
    page::{
        DiscoveryError, ErrorHandler, Handler, HandlerResponse, Loader, Loaders, Page, PageDiff,
        PageTable, RequestContext, RoutePattern, discover_pages,
    },
    reload::{RELOAD_MESSAGE, ReloadRegistry},
    render::{RenderError, RenderStep, Renderer},
    server::assets,
};

/// Customizes one page at registration.
pub type PageHook = Arc<dyn Fn(&mut Page) + Send + Sync>;

/// API handler bound to a route pattern.
struct ApiRoute {
    route: String,
    pattern: RoutePattern,
    handler: Handler,
}

/// Collects registrations before discovery runs.
pub struct EngineBuilder {
    config: KilnConfig,
    mode: Mode,
    loaders: Loaders,
    handlers: Vec<ApiRoute>,
    error_handler: Option<ErrorHandler>,
    hooks: Vec<(String, PageHook)>,
    snapshot: Option<&'static Dir<'static>>,
    bundler: Option<Arc<dyn Bundler>>,
    registry: Option<Arc<ReloadRegistry>>,
    ws_port: Option<u16>,
}

impl EngineBuilder {
    pub fn config(&self) -> &KilnConfig {
        &self.config
    }

    pub fn current_mode(&self) -> Mode {
        self.mode
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Attach a props loader to the page at `route` (exact pattern).
    pub fn loader(mut self, route: impl Into<String>, loader: Loader) -> Self {
        self.loaders.insert(route.into(), loader);
        self
    }

    /// Serve `route` (any method) with an API handler. Handlers win over pages.
    pub fn handler(mut self, route: impl Into<String>, handler: Handler) -> Self {
        let route = route.into();
        self.handlers.push(ApiRoute {
            pattern: RoutePattern::parse(&route),
            route,
            handler,
        });
        self
    }

    /// Error handler for pages that don't set their own.
    pub fn error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Adjust the page at `route` every time it is discovered.
    pub fn page<F>(mut self, route: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Page) + Send + Sync + 'static,
    {
        self.hooks.push((route.into(), Arc::new(f)));
        self
    }

    /// Cache directory embedded with `include_dir!`, read in production.
    pub fn snapshot(mut self, dir: &'static Dir<'static>) -> Self {
        self.snapshot = Some(dir);
        self
    }

    /// Replace the esbuild driver.
    pub fn bundler(mut self, bundler: Arc<dyn Bundler>) -> Self {
        self.bundler = Some(bundler);
        self
    }

    /// Share an existing client registry, e.g. one a `ReloadServer` feeds.
    pub fn registry(mut self, registry: Arc<ReloadRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Inject the hot reload client into development documents.
    pub fn hot_reload(mut self, ws_port: u16) -> Self {
        self.ws_port = Some(ws_port);
        self
    }

    /// Pick the bundle source, wire the renderer and discover pages.
    pub fn build(self) -> Result<Engine, DiscoveryError> {
        let config = Arc::new(self.config);
        let mode = self.mode;

        let source: Arc<dyn BundleSource> = match self.snapshot {
            Some(dir) if mode.is_production() => {
                Arc::new(EmbeddedStore::new(dir, config.build.cache.clone()))
            }
            _ => Arc::new(FsStore::new(config.root.clone())),
        };
        let bundles = Arc::new(BundleCache::new(source));
        debug!("engine"; "{} mode, bundles from {}", mode.label(), bundles.source_name());

        let ws_port = self.ws_port.filter(|_| mode.is_dev());
        let mut renderer = Renderer::new(Arc::clone(&bundles), config.build.cache.clone());
        if let Some(port) = ws_port {
            renderer = renderer.with_hot_reload(port);
        }

        let bundler = self
            .bundler
            .unwrap_or_else(|| Arc::new(EsbuildBundler::new(&config, mode)));

        let engine = Engine {
            mode,
            pages: PageTable::new(),
            loaders: self.loaders,
            handlers: self.handlers,
            error_handler: self.error_handler,
            hooks: self.hooks,
            bundles,
            renderer,
            bundler,
            reload: self.registry.unwrap_or_default(),
            ws_port,
            config,
        };
        engine.rescan()?;
        Ok(engine)
    }
}

pub struct Engine {
    config: Arc<KilnConfig>,
    mode: Mode,
    pages: PageTable,
    loaders: Loaders,
    handlers: Vec<ApiRoute>,
    error_handler: Option<ErrorHandler>,
    hooks: Vec<(String, PageHook)>,
    bundles: Arc<BundleCache>,
    renderer: Renderer,
    bundler: Arc<dyn Bundler>,
    reload: Arc<ReloadRegistry>,
    ws_port: Option<u16>,
}

impl Engine {
    /// Start from `config`, with the mode taken from the environment.
    pub fn builder(config: KilnConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            mode: Mode::from_env(),
            loaders: Loaders::default(),
            handlers: Vec::new(),
            error_handler: None,
            hooks: Vec::new(),
            snapshot: None,
            bundler: None,
            registry: None,
            ws_port: None,
        }
    }

    pub fn config(&self) -> &KilnConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn pages(&self) -> &PageTable {
        &self.pages
    }

    pub fn bundles(&self) -> &Arc<BundleCache> {
        &self.bundles
    }

    pub fn bundler(&self) -> &Arc<dyn Bundler> {
        &self.bundler
    }

    pub fn reload(&self) -> &Arc<ReloadRegistry> {
        &self.reload
    }

    /// Port the injected hot reload client connects to.
    pub fn ws_port(&self) -> Option<u16> {
        self.ws_port
    }

    // ========================================================================
    // pages
    // ========================================================================

    /// Walk the pages directory and register every page found.
    pub fn discover(&self) -> Result<Vec<Page>, DiscoveryError> {
        let mut pages = discover_pages(&self.config.pages_dir(), &self.config.root, &self.loaders)?;
        for page in &mut pages {
            self.register(page);
        }
        Ok(pages)
    }

    /// Rediscover and swap the live route table.
    pub fn rescan(&self) -> Result<PageDiff, DiscoveryError> {
        let pages = self.discover()?;
        Ok(self.pages.replace(pages))
    }

    /// Config section, hooks, default error handler, site defaults, version.
    fn register(&self, page: &mut Page) {
        if let Some(section) = self.config.pages.get(&page.route) {
            page.apply_section(section);
        }
        for (route, hook) in &self.hooks {
            if *route == page.route {
                hook(page);
            }
        }
        if page.error_handler.is_none() {
            page.error_handler = self.error_handler.clone();
        }
        page.apply_defaults(&self.config.site);
        page.version = self.version_of(page);
    }

    /// Short hash of the page's client bundle, empty when it isn't built.
    fn version_of(&self, page: &Page) -> String {
        let key = artifact_key(&self.config.build.cache, &page.file, Artifact::Client);
        self.bundles
            .get(&key)
            .map(|bytes| short_hash(&bytes))
            .unwrap_or_default()
    }

    /// Recompute every page's cache-busting version.
    pub fn refresh_versions(&self) {
        self.pages.update(|page| page.version = self.version_of(page));
    }

    /// Build both bundles of `page`.
    pub fn build_page(&self, page: &Page) -> Result<(), BuildError> {
        self.bundler.build(page)
    }

    /// Drop every cached bundle, refresh versions and reload the browsers.
    /// Returns how many clients were told to reload.
    pub fn invalidate(&self) -> usize {
        self.bundles.clear();
        self.refresh_versions();
        self.reload.broadcast(RELOAD_MESSAGE)
    }

    // ========================================================================
    // requests
    // ========================================================================

    /// Answer one request. Never panics on page or handler errors.
    ///
    /// Cache assets first, then API handlers, then pages.
    pub fn handle(&self, req: &RequestContext) -> HandlerResponse {
        if let Some(resp) = assets::serve_asset(&self.bundles, &self.config.build.cache, &req.path)
        {
            return resp;
        }

        if let Some(resp) = self.dispatch_api(req) {
            return resp;
        }

        let Some((page, params)) = self.pages.find(&req.path) else {
            return HandlerResponse::text(404, "404 Not Found");
        };

        if !matches!(req.method.as_str(), "GET" | "HEAD") {
            return HandlerResponse::text(405, "405 Method Not Allowed");
        }

        let mut req = req.clone();
        req.params = params;
        self.renderer.respond(&page, &req)
    }

    fn dispatch_api(&self, req: &RequestContext) -> Option<HandlerResponse> {
        let (api, params) = self
            .handlers
            .iter()
            .filter_map(|api| api.pattern.matches(&req.path).map(|params| (api, params)))
            .max_by(|(a, _), (b, _)| a.pattern.rank().cmp(&b.pattern.rank()))?;

        let mut req = req.clone();
        req.params = params;

        Some((api.handler)(&req).unwrap_or_else(|e| {
            let err = RenderError::new(RenderStep::HandlerExecution, "Handler failed", format!("{e:#}"));
            crate::log!("api"; "{}: {}", api.route, err);
            HandlerResponse::json(
                500,
                &json!({
                    "error": err.to_string(),
                    "route": api.route,
                }),
            )
        }))
    }
}
