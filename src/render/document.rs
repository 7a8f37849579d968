//! HTML document composition.

use std::fmt::{self, Write};

use crate::{
    embed::serve::{DOCUMENT_HTML, DocumentVars},
    page::Page,
    utils::html::{escape, escape_attr, escape_script_json},
};

/// Asset URLs referenced by a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assets {
    pub favicon: String,
    pub stylesheet: Option<String>,
    /// Hydration bundle. `None` for non-interactive pages.
    pub script: Option<String>,
}

/// Everything one document is made of.
pub struct Document<'a> {
    pub page: &'a Page,
    /// Server-rendered markup for the mount point.
    pub markup: &'a str,
    pub props_json: &'a str,
    pub assets: &'a Assets,
    /// Inline hot reload client, development only.
    pub dev_script: Option<&'a str>,
}

impl Document<'_> {
    pub fn compose(&self) -> Result<String, fmt::Error> {
        let head = self.head()?;
        let scripts = self.scripts()?;
        let body_attrs = if self.page.class.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", escape_attr(&self.page.class))
        };

        Ok(DOCUMENT_HTML.render(&DocumentVars {
            lang: &escape_attr(&self.page.lang),
            head: &head,
            body_attrs: &body_attrs,
            body: self.markup,
            scripts: &scripts,
        }))
    }

    fn head(&self) -> Result<String, fmt::Error> {
        let page = self.page;
        let mut head = String::new();

        if !page.title.is_empty() {
            writeln!(head, "<title>{}</title>", escape(&page.title))?;
        }
        writeln!(
            head,
            r#"<link rel="icon" type="image/svg+xml" href="{}">"#,
            escape_attr(&self.assets.favicon)
        )?;
        if let Some(href) = &self.assets.stylesheet {
            writeln!(head, r#"<link rel="stylesheet" href="{}">"#, escape_attr(href))?;
        }

        for meta in &page.meta_tags {
            head.push_str("<meta");
            for (attr, value) in [
                ("name", &meta.name),
                ("property", &meta.property),
                ("content", &meta.content),
            ] {
                if !value.is_empty() {
                    write!(head, r#" {attr}="{}""#, escape_attr(value))?;
                }
            }
            head.push_str(">\n");
        }

        for link in &page.links {
            writeln!(
                head,
                r#"<link rel="{}" href="{}">"#,
                escape_attr(&link.rel),
                escape_attr(&link.href)
            )?;
        }
        Ok(head)
    }

    fn scripts(&self) -> Result<String, fmt::Error> {
        let mut scripts = String::new();

        if self.page.interactive
            && let Some(src) = &self.assets.script
        {
            writeln!(
                scripts,
                "<script>window.PAGE_PROPS = {};</script>",
                escape_script_json(self.props_json)
            )?;
            writeln!(scripts, r#"<script type="module" src="{}"></script>"#, escape_attr(src))?;
        }

        if let Some(dev) = self.dev_script {
            writeln!(scripts, "<script>{dev}</script>")?;
        }
        Ok(scripts)
    }
}
