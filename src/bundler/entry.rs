//! Synthetic entry modules.
//!
//! esbuild is given a generated module per page and side that imports the
//! component by absolute path. The path is inserted as a JSON string literal,
//! which is also a valid JS string literal, so no file name can break out of
//! the import specifier.

use std::{
    fs,
    path::{Path, PathBuf},
};

use super::BuildError;
use crate::cache::ensure_parent;

/// Server entry: exposes `globalThis.renderPage(props) -> string`.
pub fn server_entry(specifier: &str) -> String {
    format!(
        r#"import React from "react";
import {{ renderToString }} from "react-dom/server.edge";
import Page from {specifier};

globalThis.renderPage = function renderPage(props) {{
  return renderToString(<Page {{...props}} />);
}};
"#
    )
}

/// Client entry: hydrates `#page` with `window.PAGE_PROPS`.
pub fn client_entry(specifier: &str) -> String {
    format!(
        r#"import React from "react";
import {{ hydrateRoot }} from "react-dom/client";
import Page from {specifier};

hydrateRoot(document.getElementById("page"), <Page {{...(window.PAGE_PROPS || {{}})}} />);
"#
    )
}

/// Import specifier for an absolute component path.
pub fn import_specifier(component: &Path) -> String {
    let path = component.to_string_lossy().replace('\\', "/");
    // serializing a str cannot fail
    serde_json::to_string(&path).unwrap_or_else(|_| format!("\"{path}\""))
}

/// Entry files written for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entries {
    pub server: PathBuf,
    pub client: PathBuf,
}

/// Write both entries for `page_file` (relative to `root`) under `entries_dir`.
///
/// Files are only rewritten when their content changes, so a running esbuild
/// watcher does not rebuild for nothing.
pub fn write_entries(entries_dir: &Path, root: &Path, page_file: &Path) -> Result<Entries, BuildError> {
    let stem = page_file.with_extension("");
    let specifier = import_specifier(&root.join(page_file));

    let entries = Entries {
        server: entries_dir.join(with_suffix(&stem, ".server.tsx")),
        client: entries_dir.join(with_suffix(&stem, ".client.tsx")),
    };
    write_if_changed(&entries.server, &server_entry(&specifier))?;
    write_if_changed(&entries.client, &client_entry(&specifier))?;
    Ok(entries)
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_if_changed(path: &Path, content: &str) -> Result<(), BuildError> {
    if fs::read_to_string(path).is_ok_and(|old| old == content) {
        return Ok(());
    }
    ensure_parent(path)
        .and_then(|()| fs::write(path, content))
        .map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })
}
