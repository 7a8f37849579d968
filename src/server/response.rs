//! HTTP response helpers.

use anyhow::Result;
use tiny_http::{Header, Request, Response, StatusCode};

use crate::{page::HandlerResponse, utils::mime::types::PLAIN};

/// Write `resp` to the client. HEAD requests get the headers only.
pub fn send(request: Request, resp: HandlerResponse) -> Result<()> {
    let head = request.method() == &tiny_http::Method::Head;
    let body = if head { Vec::new() } else { resp.body };

    let mut response = Response::from_data(body).with_status_code(StatusCode(resp.status));
    if let Some(header) = make_header("Content-Type", &resp.content_type) {
        response = response.with_header(header);
    }
    if let Some(header) = make_header("Cache-Control", "no-cache") {
        response = response.with_header(header);
    }

    request.respond(response)?;
    Ok(())
}

/// 503 while shutting down.
pub fn respond_unavailable(request: Request) -> Result<()> {
    send(request, HandlerResponse::text(503, "503 Service Unavailable"))
}

/// 400 for a request that couldn't be read.
pub fn respond_bad_request(request: Request, reason: &str) -> Result<()> {
    send(request, HandlerResponse::new(400, PLAIN, format!("400 Bad Request: {reason}")))
}

fn make_header(key: &str, value: &str) -> Option<Header> {
    Header::from_bytes(key.as_bytes(), value.as_bytes()).ok()
}
