//! File-system routing.
//!
//! `pages/index.tsx` → `/`, `pages/blog/[slug].tsx` → `/blog/:slug`.
//! Matching prefers static segments over parameters at the first position
//! where two patterns differ.

use std::path::{Component, Path};

use percent_encoding::percent_decode_str;
use rustc_hash::FxHashMap;

/// Decoded path parameters of a matched route.
pub type Params = FxHashMap<String, String>;

/// Derive a route from a page file path relative to the pages directory.
///
/// Only a bare `index` at the pages root maps to `/`. Nested `index` files
/// keep their segment (`docs/index.tsx` → `/docs/index`).
pub fn route_from_file(relative: &Path) -> String {
    let stem = relative.with_extension("");
    let segments: Vec<String> = stem
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if segments.len() == 1 && segments[0] == "index" {
        return "/".to_string();
    }

    let mut route = String::new();
    for segment in &segments {
        route.push('/');
        match segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            Some(name) if !name.is_empty() => {
                route.push(':');
                route.push_str(name);
            }
            _ => route.push_str(segment),
        }
    }

    if route.is_empty() { "/".to_string() } else { route }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

/// Parsed `/segment/:param` route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(route: &str) -> Self {
        let segments = split(route)
            .map(|s| match s.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Static(s.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// Match a request path, returning decoded parameters.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = split(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            let decoded = percent_decode_str(part).decode_utf8_lossy();
            match segment {
                Segment::Static(s) if *s == decoded => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => {
                    if decoded.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), decoded.into_owned());
                }
            }
        }
        Some(params)
    }

    /// Ordering key: static segments rank above parameters, position by position.
    pub fn rank(&self) -> Vec<u8> {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Static(_) => 1,
                Segment::Param(_) => 0,
            })
            .collect()
    }

    /// Names of the parameters in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
