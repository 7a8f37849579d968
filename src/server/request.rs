//! tiny_http request → [`RequestContext`].

use std::io::Read;

use anyhow::{Context, Result, bail};
use tiny_http::Request;

use crate::page::{RequestContext, parse_query, split_url};

/// Largest body an API handler is handed.
const MAX_BODY_BYTES: u64 = 8 * 1024 * 1024;

/// Read method, URL, headers and body of `request`.
pub fn to_context(request: &mut Request) -> Result<RequestContext> {
    let (path, query) = split_url(request.url());
    let path = path.to_string();
    let query = parse_query(query);

    let headers = request
        .headers()
        .iter()
        .map(|h| {
            (
                h.field.as_str().as_str().to_ascii_lowercase(),
                h.value.as_str().to_string(),
            )
        })
        .collect();

    let mut body = Vec::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut body)
        .context("Failed to read request body")?;
    if body.len() as u64 > MAX_BODY_BYTES {
        bail!("request body exceeds {MAX_BODY_BYTES} bytes");
    }

    Ok(RequestContext {
        method: request.method().as_str().to_ascii_uppercase(),
        path,
        query,
        headers,
        body,
        ..Default::default()
    })
}
