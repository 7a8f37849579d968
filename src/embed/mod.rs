//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Document skeleton, hot reload client, default favicon
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{HOTRELOAD_JS, HotreloadVars};
//!
//! let js = HOTRELOAD_JS.render(&HotreloadVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

/// Written to the cache directory when no favicon exists.
pub const FAVICON_SVG: &str = include_str!("serve/favicon.svg");

pub mod serve {
    use super::{Template, TemplateVars};

    /// Variables for hotreload.js.
    pub struct HotreloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for HotreloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__KILN_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Hot reload client with WebSocket port injection.
    pub const HOTRELOAD_JS: Template<HotreloadVars> =
        Template::new(include_str!("serve/hotreload.js"));

    /// Variables for document.html. Values are inserted verbatim.
    pub struct DocumentVars<'a> {
        pub lang: &'a str,
        pub head: &'a str,
        /// ` class="..."` or empty
        pub body_attrs: &'a str,
        pub body: &'a str,
        pub scripts: &'a str,
    }

    impl TemplateVars for DocumentVars<'_> {
        /// Single pass over the skeleton, so rendered markup that happens to
        /// contain a placeholder name is never substituted again.
        fn apply(&self, content: &str) -> String {
            let slots = [
                ("__LANG__", self.lang),
                ("__HEAD__", self.head),
                ("__CLASS__", self.body_attrs),
                ("__BODY__", self.body),
                ("__SCRIPTS__", self.scripts),
            ];

            let mut out = String::with_capacity(content.len() + self.body.len() + self.head.len());
            let mut rest = content;
            for (placeholder, value) in slots {
                if let Some((before, after)) = rest.split_once(placeholder) {
                    out.push_str(before);
                    out.push_str(value);
                    rest = after;
                }
            }
            out.push_str(rest);
            out
        }
    }

    /// Page document skeleton.
    pub const DOCUMENT_HTML: Template<DocumentVars<'static>> =
        Template::new(include_str!("serve/document.html"));
}
