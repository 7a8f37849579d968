//! Pages: route bindings between a URL pattern and a component file.
//!
//! # Module Structure
//!
//! ```text
//! page/
//! ├── route      # file → route derivation, pattern matching
//! ├── discover   # recursive walk of the pages directory
//! ├── validate   # pre-build checks
//! ├── loader     # props, request context, loaders and handlers
//! ├── table      # live route table shared with the server
//! └── mod.rs     # Page, MetaTag, Link, defaults merge (this file)
//! ```
//!
//! A `Page` is an immutable template. The live table hands out `Arc<Page>`,
//! and per-request props are resolved next to it, never written into it.

mod discover;
mod loader;
mod route;
mod table;
mod validate;

pub use discover::{DiscoveryError, PAGE_EXTENSIONS, discover_pages, is_page_file};
pub use loader::{
    ErrorHandler, Handler, HandlerResponse, Loader, Loaders, Props, RequestContext,
    SerializeJson, handler, loader, parse_query, split_url,
};
pub use route::{Params, RoutePattern, route_from_file};
pub use table::{PageDiff, PageTable};
pub use validate::{PageIssue, ValidationReport, validate_pages};

use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{PageSection, SiteConfig};

/// `<meta name content property>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaTag {
    pub name: String,
    pub content: String,
    pub property: String,
}

impl MetaTag {
    pub fn named(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            property: String::new(),
        }
    }
}

/// `<link rel href>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
        }
    }
}

/// A discovered page.
#[derive(Clone)]
pub struct Page {
    /// `/` or `/segment/:param`
    pub route: String,
    pub pattern: RoutePattern,
    /// Component path relative to the project root.
    pub file: PathBuf,
    /// Ship the hydration bundle and `PAGE_PROPS`.
    pub interactive: bool,
    /// Static props, used when no loader is attached.
    pub props: Option<Props>,
    pub title: String,
    pub lang: String,
    pub class: String,
    pub meta_tags: Vec<MetaTag>,
    pub links: Vec<Link>,
    pub loader: Option<Loader>,
    pub error_handler: Option<ErrorHandler>,
    /// Cache-busting token for client assets. Empty when no bundle exists yet.
    pub version: String,
}

impl Page {
    pub fn new(route: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        let route = route.into();
        Self {
            pattern: RoutePattern::parse(&route),
            route,
            file: file.into(),
            interactive: true,
            props: None,
            title: String::new(),
            lang: String::new(),
            class: String::new(),
            meta_tags: Vec::new(),
            links: Vec::new(),
            loader: None,
            error_handler: None,
            version: String::new(),
        }
    }

    /// Apply `[pages."<route>"]` overrides. Set values win.
    pub fn apply_section(&mut self, section: &PageSection) {
        if let Some(title) = section.title.as_ref().filter(|t| !t.is_empty()) {
            self.title = title.clone();
        }
        if let Some(lang) = section.lang.as_ref().filter(|l| !l.is_empty()) {
            self.lang = lang.clone();
        }
        if let Some(class) = section.class.as_ref().filter(|c| !c.is_empty()) {
            self.class = class.clone();
        }
        if let Some(interactive) = section.interactive {
            self.interactive = interactive;
        }
        if let Some(props) = &section.props {
            self.props = Some(Props::new(props.clone()));
        }
        self.meta_tags.extend(section.meta.iter().cloned());
        self.links.extend(section.links.iter().cloned());
    }

    /// Merge process-wide defaults: page values win when non-empty,
    /// site meta tags and links are appended after the page's own.
    pub fn apply_defaults(&mut self, site: &SiteConfig) {
        if self.lang.is_empty() {
            self.lang = site.lang.clone();
        }
        if self.lang.is_empty() {
            self.lang = "en".into();
        }
        if self.title.is_empty() {
            self.title = site.title.clone();
        }
        if self.class.is_empty() {
            self.class = site.class.clone();
        }
        self.meta_tags.extend(site.meta.iter().cloned());
        self.links.extend(site.links.iter().cloned());
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("route", &self.route)
            .field("file", &self.file)
            .field("interactive", &self.interactive)
            .field("title", &self.title)
            .field("lang", &self.lang)
            .field("loader", &self.loader.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults_merge() {
        let config = test_parse_config(
            r#"
[site]
title = "Site"
class = "dark"

[[site.meta]]
name = "generator"
content = "kiln"
"#,
        );

        let mut page = Page::new("/", "pages/index.tsx");
        page.meta_tags.push(MetaTag::named("description", "home"));
        page.apply_defaults(&config.site);

        assert_eq!(page.title, "Site");
        assert_eq!(page.lang, "en");
        assert_eq!(page.class, "dark");
        let names: Vec<_> = page.meta_tags.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["description", "generator"]);
    }

    #[test]
    fn test_page_values_win() {
        let config = test_parse_config("[site]\ntitle = \"Site\"\nlang = \"fr\"");
        let mut page = Page::new("/about", "pages/about.tsx");
        page.title = "About".into();
        page.lang = "de".into();
        page.apply_defaults(&config.site);
        assert_eq!(page.title, "About");
        assert_eq!(page.lang, "de");
    }

    #[test]
    fn test_empty_site_lang_falls_back_to_en() {
        let config = test_parse_config("[site]\nlang = \"\"");
        let mut page = Page::new("/", "pages/index.tsx");
        page.apply_defaults(&config.site);
        assert_eq!(page.lang, "en");
    }

    #[test]
    fn test_apply_section() {
        let config = test_parse_config(
            r#"
[pages."/about"]
title = "About"
interactive = false
props = { team = "core" }

[[pages."/about".links]]
rel = "canonical"
href = "https://example.com/about"
"#,
        );

        let mut page = Page::new("/about", "pages/about.tsx");
        page.apply_section(&config.pages["/about"]);

        assert_eq!(page.title, "About");
        assert!(!page.interactive);
        assert_eq!(page.props.unwrap().to_json().unwrap(), r#"{"team":"core"}"#);
        assert_eq!(page.links, vec![Link::new("canonical", "https://example.com/about")]);
    }
}
