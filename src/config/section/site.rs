//! `[site]` section configuration.
//!
//! Process-wide document defaults merged into every page.
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "My App"
//! lang = "en"
//! class = "dark"
//!
//! [[site.meta]]
//! name = "description"
//! content = "Server-rendered React"
//!
//! [[site.links]]
//! rel = "preconnect"
//! href = "https://fonts.example.com"
//! ```

use serde::{Deserialize, Serialize};

use crate::page::{Link, MetaTag};

/// Document defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Fallback `<title>` for pages without their own.
    pub title: String,

    /// `<html lang>`; pages without a language get this, then `en`.
    pub lang: String,

    /// `<html class>`.
    pub class: String,

    /// Meta tags appended to every page's own.
    pub meta: Vec<MetaTag>,

    /// Head links appended to every page's own.
    pub links: Vec<Link>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            lang: "en".into(),
            class: String::new(),
            meta: Vec::new(),
            links: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_site_config() {
        let config = test_parse_config(
            r#"
[site]
title = "Shop"
class = "dark"

[[site.meta]]
name = "description"
content = "things"

[[site.meta]]
property = "og:type"
content = "website"

[[site.links]]
rel = "manifest"
href = "/manifest.json"
"#,
        );

        assert_eq!(config.site.title, "Shop");
        assert_eq!(config.site.lang, "en");
        assert_eq!(config.site.class, "dark");
        assert_eq!(config.site.meta.len(), 2);
        assert_eq!(config.site.meta[1].property, "og:type");
        assert_eq!(config.site.meta[1].name, "");
        assert_eq!(config.site.links[0].href, "/manifest.json");
    }

    #[test]
    fn test_site_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.site.title, "");
        assert_eq!(config.site.lang, "en");
        assert!(config.site.meta.is_empty());
    }
}
