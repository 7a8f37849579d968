//! In-process bundler for tests.
//!
//! A page's source is taken to be its server bundle verbatim: it must define
//! `globalThis.renderPage`. The client bundle is a stub, and a sibling
//! `<stem>.css` is copied as the page stylesheet. A source containing `<<<`
//! fails like esbuild does on invalid syntax.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use super::{BuildError, Bundler, build_error_hint};
use crate::{
    cache::{Artifact, artifact_key, ensure_parent},
    page::Page,
};

pub struct FakeBundler {
    root: PathBuf,
    cache: PathBuf,
    builds: AtomicUsize,
}

impl FakeBundler {
    pub fn new(root: impl Into<PathBuf>, cache: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: cache.into(),
            builds: AtomicUsize::new(0),
        }
    }

    /// Successful builds so far.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    fn write(&self, page: &Page, artifact: Artifact, content: &str) -> Result<(), BuildError> {
        let path = self.root.join(artifact_key(&self.cache, &page.file, artifact));
        ensure_parent(&path)
            .and_then(|()| fs::write(&path, content))
            .map_err(|source| BuildError::Io { path, source })
    }
}

impl Bundler for FakeBundler {
    fn build(&self, page: &Page) -> Result<(), BuildError> {
        let path = self.root.join(&page.file);
        let source = fs::read_to_string(&path).map_err(|source| BuildError::Io {
            path: path.clone(),
            source,
        })?;

        if source.contains("<<<") {
            let detail = format!("{}:1:0: Unexpected token \"<<<\"", page.file.display());
            return Err(BuildError::Server {
                hint: build_error_hint(&detail),
                detail,
            });
        }

        self.write(page, Artifact::Server, &source)?;
        self.write(
            page,
            Artifact::Client,
            &format!("/* hydrate {} */", page.file.display()),
        )?;

        match fs::read_to_string(path.with_extension("css")) {
            Ok(css) => self.write(page, Artifact::Style, &css)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(BuildError::Io {
                    path: path.with_extension("css"),
                    source,
                });
            }
        }

        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Write `content` at `root/relative`, creating parents.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
