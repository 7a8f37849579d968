use std::{fs, path::Path, sync::Arc};

use rustc_hash::FxHashMap;

use super::{
    BuildWatchers, ChangeKind,
    pages::{affects_routes, apply_changes},
};
use crate::{
    bundler::testing::{FakeBundler, write_file},
    config::KilnConfig,
    core::Mode,
    engine::Engine,
};

const PAGE: &str = r#"globalThis.renderPage = (p) => "<p>page</p>";"#;

fn engine(root: &Path) -> (Arc<Engine>, Arc<FakeBundler>) {
    let bundler = Arc::new(FakeBundler::new(root, ".cache"));
    let engine = Engine::builder(KilnConfig::default().with_root(root))
        .mode(Mode::Development)
        .bundler(bundler.clone())
        .build()
        .unwrap();
    (Arc::new(engine), bundler)
}

#[test]
fn test_new_page_is_built_and_watched() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "pages/index.tsx", PAGE);
    let (engine, bundler) = engine(dir.path());
    let builds = BuildWatchers::new(engine.bundler().clone());
    assert_eq!(engine.pages().routes(), vec!["/"]);

    write_file(dir.path(), "pages/blog/[slug].tsx", PAGE);
    let diff = apply_changes(&engine, &builds).unwrap();

    assert_eq!(diff.added, vec!["/blog/:slug"]);
    assert!(diff.removed.is_empty());
    assert_eq!(bundler.builds(), 1);
    assert!(dir.path().join(".cache/pages/blog/[slug].ssr.js").is_file());
    assert!(builds.contains(Path::new("pages/blog/[slug].tsx")));
    assert!(!builds.contains(Path::new("pages/index.tsx")));
    // version picked up from the fresh client bundle
    assert!(!engine.pages().get("/blog/:slug").unwrap().version.is_empty());
}

#[test]
fn test_removed_page_stops_watching() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "pages/index.tsx", PAGE);
    write_file(dir.path(), "pages/about.tsx", PAGE);
    let (engine, _) = engine(dir.path());
    let builds = BuildWatchers::new(engine.bundler().clone());
    for page in engine.pages().snapshot() {
        builds.start(&page).unwrap();
    }
    assert_eq!(builds.len(), 2);

    fs::remove_file(dir.path().join("pages/about.tsx")).unwrap();
    let diff = apply_changes(&engine, &builds).unwrap();

    assert_eq!(diff.removed, vec!["/about"]);
    assert!(engine.pages().find("/about").is_none());
    assert!(!builds.contains(Path::new("pages/about.tsx")));
    assert_eq!(builds.len(), 1);
}

#[test]
fn test_broken_new_page_is_still_watched() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, bundler) = engine(dir.path());
    let builds = BuildWatchers::new(engine.bundler().clone());

    write_file(dir.path(), "pages/bad.tsx", "export default <<< nope");
    let diff = apply_changes(&engine, &builds).unwrap();

    // the route exists, rendering will report the missing bundle
    assert_eq!(diff.added, vec!["/bad"]);
    assert_eq!(bundler.builds(), 0);
    assert!(!dir.path().join(".cache/pages/bad.ssr.js").exists());
    // the watcher is what rebuilds it once the source is fixed
    assert!(builds.contains(Path::new("pages/bad.tsx")));
}

#[test]
fn test_affects_routes() {
    let dir = tempfile::tempdir().unwrap();
    let mut changes = FxHashMap::default();

    changes.insert(dir.path().join("index.tsx"), ChangeKind::Modified);
    assert!(!affects_routes(&changes));

    changes.insert(dir.path().join("styles.css"), ChangeKind::Created);
    assert!(!affects_routes(&changes));

    changes.insert(dir.path().join("about.jsx"), ChangeKind::Created);
    assert!(affects_routes(&changes));

    let mut changes = FxHashMap::default();
    changes.insert(dir.path().join("blog"), ChangeKind::Removed);
    assert!(affects_routes(&changes));
}
