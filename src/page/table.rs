//! Live route table.
//!
//! Read by the HTTP layer on every request, replaced by the pages watcher.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Page, Params};

/// Routes added and removed by a table replacement.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl PageDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Default)]
pub struct PageTable {
    pages: Mutex<Vec<Arc<Page>>>,
}

impl PageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pages, cheap to clone.
    pub fn snapshot(&self) -> Vec<Arc<Page>> {
        self.pages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.lock().is_empty()
    }

    pub fn routes(&self) -> Vec<String> {
        self.pages.lock().iter().map(|p| p.route.clone()).collect()
    }

    pub fn get(&self, route: &str) -> Option<Arc<Page>> {
        self.pages.lock().iter().find(|p| p.route == route).cloned()
    }

    /// Replace every page, reporting which routes appeared or vanished.
    pub fn replace(&self, pages: Vec<Page>) -> PageDiff {
        let new: Vec<Arc<Page>> = pages.into_iter().map(Arc::new).collect();
        let mut guard = self.pages.lock();

        let added = new
            .iter()
            .filter(|p| !guard.iter().any(|old| old.route == p.route))
            .map(|p| p.route.clone())
            .collect();
        let removed = guard
            .iter()
            .filter(|old| !new.iter().any(|p| p.route == old.route))
            .map(|p| p.route.clone())
            .collect();

        *guard = new;
        PageDiff { added, removed }
    }

    /// Rewrite every page in place (e.g. refreshed cache-busting versions).
    pub fn update(&self, mut f: impl FnMut(&mut Page)) {
        let mut guard = self.pages.lock();
        for page in guard.iter_mut() {
            f(Arc::make_mut(page));
        }
    }

    /// Best match for a request path: static segments beat parameters.
    pub fn find(&self, path: &str) -> Option<(Arc<Page>, Params)> {
        let guard = self.pages.lock();
        guard
            .iter()
            .filter_map(|page| page.pattern.matches(path).map(|params| (page, params)))
            .max_by(|(a, _), (b, _)| a.pattern.rank().cmp(&b.pattern.rank()))
            .map(|(page, params)| (Arc::clone(page), params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(routes: &[&str]) -> PageTable {
        let table = PageTable::new();
        table.replace(
            routes
                .iter()
                .map(|r| Page::new(*r, format!("pages{r}.tsx")))
                .collect(),
        );
        table
    }

    #[test]
    fn test_find_static_beats_param() {
        let table = table(&["/users/:id", "/users/new", "/"]);
        let (page, params) = table.find("/users/new").unwrap();
        assert_eq!(page.route, "/users/new");
        assert!(params.is_empty());

        let (page, params) = table.find("/users/42").unwrap();
        assert_eq!(page.route, "/users/:id");
        assert_eq!(params["id"], "42");

        assert_eq!(table.find("/").unwrap().0.route, "/");
        assert!(table.find("/nope/x/y").is_none());
    }

    #[test]
    fn test_replace_diff() {
        let table = table(&["/", "/about"]);
        let diff = table.replace(vec![
            Page::new("/", "pages/index.tsx"),
            Page::new("/blog/:slug", "pages/blog/[slug].tsx"),
        ]);
        assert_eq!(diff.added, vec!["/blog/:slug"]);
        assert_eq!(diff.removed, vec!["/about"]);
        assert_eq!(table.len(), 2);

        let diff = table.replace(table.snapshot().iter().map(|p| (**p).clone()).collect());
        assert!(diff.is_empty());
    }

    #[test]
    fn test_update_copies_on_write() {
        let table = table(&["/"]);
        let before = table.get("/").unwrap();
        table.update(|page| page.version = "abc".into());
        assert_eq!(table.get("/").unwrap().version, "abc");
        assert_eq!(before.version, "");
    }
}
