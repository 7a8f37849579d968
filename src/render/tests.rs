use std::{fs, sync::Arc};

use tempfile::TempDir;

use super::*;
use crate::{
    cache::FsStore,
    page::{HandlerResponse, Page, Props, RequestContext, loader},
};

const SSR: &str = r#"globalThis.renderPage = function renderPage(props) {
    return "<main>" + JSON.stringify(props) + "</main>";
};"#;

struct Fixture {
    dir: TempDir,
    renderer: Renderer,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let bundles = Arc::new(BundleCache::new(Arc::new(FsStore::new(dir.path()))));
        let renderer = Renderer::new(bundles, ".cache");
        Self { dir, renderer }
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn with_bundles(self) -> Self {
        self.write(".cache/pages/index.ssr.js", SSR);
        self.write(".cache/pages/index.js", "hydrate()");
        self
    }
}

fn page() -> Page {
    Page::new("/", "pages/index.tsx")
}

#[test]
fn test_renders_empty_props() {
    let fx = Fixture::new().with_bundles();
    let html = fx.renderer.render(&page(), &RequestContext::get("/")).unwrap();

    assert!(html.contains(r#"<div id="page"><main>{}</main></div>"#));
    assert!(html.contains("window.PAGE_PROPS = {};"));
    assert!(html.contains(r#"src="/.cache/pages/index.js""#));
    assert!(html.contains(r#"href="/.cache/favicon.svg""#));
    // no stylesheet was built
    assert!(!html.contains("rel=\"stylesheet\""));
}

#[test]
fn test_static_props_and_version() {
    let fx = Fixture::new().with_bundles();
    fx.write(".cache/pages/index.css", "body{}");

    let mut page = page();
    page.props = Some(Props::new(serde_json::json!({ "title": "static" })));
    page.version = "0a1b2c".into();

    let html = fx.renderer.render(&page, &RequestContext::get("/")).unwrap();
    assert!(html.contains(r#"<main>{"title":"static"}</main>"#));
    assert!(html.contains(r#"src="/.cache/pages/index.js?v=0a1b2c""#));
    assert!(html.contains(r#"href="/.cache/pages/index.css?v=0a1b2c""#));
}

#[test]
fn test_loader_supersedes_static_props() {
    let fx = Fixture::new().with_bundles();
    let mut page = page();
    page.props = Some(Props::new(serde_json::json!({ "from": "static" })));
    page.loader = Some(loader(|req| {
        Ok(Props::new(serde_json::json!({ "from": "loader", "q": req.query("q") })))
    }));

    let html = fx.renderer.render(&page, &RequestContext::get("/?q=1")).unwrap();
    assert!(html.contains(r#"<main>{"from":"loader","q":"1"}</main>"#));
    // the template keeps its own props
    assert_eq!(
        page.props.as_ref().unwrap().to_json().unwrap(),
        r#"{"from":"static"}"#
    );
}

#[test]
fn test_loader_error_writes_no_html() {
    let fx = Fixture::new().with_bundles();
    let mut page = page();
    page.loader = Some(loader(|_| anyhow::bail!("database unavailable")));

    let err = fx.renderer.render(&page, &RequestContext::get("/")).unwrap_err();
    assert_eq!(err.step, RenderStep::LoaderExecution);
    assert_eq!(err.details, "database unavailable");

    let response = fx.renderer.respond(&page, &RequestContext::get("/"));
    assert_eq!(response.status, 500);
    assert_eq!(response.content_type, "application/json");
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("loader execution"));
    assert!(!response.body_str().contains("<html"));
}

#[test]
fn test_unserializable_props() {
    struct Broken;
    impl serde::Serialize for Broken {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot serialize"))
        }
    }

    let fx = Fixture::new().with_bundles();
    let mut page = page();
    page.props = Some(Props::new(Broken));

    let err = fx.renderer.render(&page, &RequestContext::get("/")).unwrap_err();
    assert_eq!(err.step, RenderStep::PropsSerialization);
}

#[test]
fn test_component_error_is_hinted() {
    let fx = Fixture::new();
    fx.write(
        ".cache/pages/index.ssr.js",
        "globalThis.renderPage = function (p) { return p.user.name; };",
    );
    fx.write(".cache/pages/index.js", "");

    let err = fx.renderer.render(&page(), &RequestContext::get("/")).unwrap_err();
    assert_eq!(err.step, RenderStep::ServerRendering);
    assert_eq!(
        err.details,
        "Type error in component - check that props match expected types"
    );

    let body: serde_json::Value =
        serde_json::from_slice(&fx.renderer.respond(&page(), &RequestContext::get("/")).body)
            .unwrap();
    assert_eq!(body["file"], "pages/index.tsx");
}

#[test]
fn test_missing_client_bundle() {
    let fx = Fixture::new();
    fx.write(".cache/pages/index.ssr.js", SSR);

    let err = fx.renderer.render(&page(), &RequestContext::get("/")).unwrap_err();
    assert_eq!(err.step, RenderStep::BundleLoading);
    assert_eq!(err.details, "Expected files for: pages/index.tsx");

    // a static page does not need it
    let mut static_page = page();
    static_page.interactive = false;
    let html = fx.renderer.render(&static_page, &RequestContext::get("/")).unwrap();
    assert!(!html.contains("PAGE_PROPS"));
    assert!(!html.contains("<script"));
}

#[test]
fn test_missing_server_bundle() {
    let fx = Fixture::new();
    let err = fx.renderer.render(&page(), &RequestContext::get("/")).unwrap_err();
    assert_eq!(err.step, RenderStep::BundleLoading);
    assert_eq!(err.message, "Server bundle not found");
}

#[test]
fn test_error_handler_replaces_default() {
    let fx = Fixture::new();
    let mut page = page();
    page.error_handler = Some(Arc::new(|_req: &RequestContext, err: &RenderError, page: &Page| {
        HandlerResponse::text(503, format!("{} failed at {}", page.route, err.step))
    }));

    let response = fx.renderer.respond(&page, &RequestContext::get("/"));
    assert_eq!(response.status, 503);
    assert_eq!(response.body_str(), "/ failed at bundle loading");
}

#[test]
fn test_hot_reload_script() {
    let fx = Fixture::new().with_bundles();
    let renderer = fx.renderer.with_hot_reload(40000);
    let html = renderer.render(&page(), &RequestContext::get("/")).unwrap();
    assert!(html.contains("const port = 40000;"));
}

#[test]
fn test_concurrent_renders_share_bundles() {
    let fx = Fixture::new().with_bundles();
    let renderer = Arc::new(fx.renderer);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let renderer = Arc::clone(&renderer);
            std::thread::spawn(move || {
                let mut page = page();
                page.loader = Some(loader(move |_| Ok(Props::new(serde_json::json!({ "i": i })))));
                renderer.render(&page, &RequestContext::get("/")).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let html = handle.join().unwrap();
        assert!(html.contains(&format!(r#"<main>{{"i":{i}}}</main>"#)));
    }
    drop(fx.dir);
}
