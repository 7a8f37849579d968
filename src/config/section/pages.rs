//! `[pages."<route>"]` per-route overrides.
//!
//! # Example
//!
//! ```toml
//! [pages."/about"]
//! title = "About us"
//! interactive = false          # ship server markup only
//!
//! [pages."/blog/:slug"]
//! props = { layout = "wide" }  # static props when no loader is registered
//! ```

use serde::{Deserialize, Serialize};

use crate::page::{Link, MetaTag};

/// Overrides for one discovered route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSection {
    pub title: Option<String>,
    pub lang: Option<String>,
    pub class: Option<String>,
    pub interactive: Option<bool>,
    pub props: Option<toml::Value>,
    pub meta: Vec<MetaTag>,
    pub links: Vec<Link>,
}
