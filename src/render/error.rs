//! Render failures, tagged with the pipeline step that failed.

use std::fmt;

use serde_json::json;
use thiserror::Error;

use crate::{
    bundler::truncate,
    page::{HandlerResponse, Page},
};

/// Pipeline step of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStep {
    LoaderExecution,
    HandlerExecution,
    PropsSerialization,
    ServerRendering,
    BundleLoading,
    TemplateExecution,
}

impl RenderStep {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LoaderExecution => "loader execution",
            Self::HandlerExecution => "handler execution",
            Self::PropsSerialization => "props serialization",
            Self::ServerRendering => "server-side rendering",
            Self::BundleLoading => "bundle loading",
            Self::TemplateExecution => "template execution",
        }
    }

    /// Steps whose failure is tied to the page's component file.
    const fn names_file(self) -> bool {
        matches!(self, Self::ServerRendering | Self::BundleLoading)
    }
}

impl fmt::Display for RenderStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Rendering failed at {step}: {message}{}", details_suffix(.details))]
pub struct RenderError {
    pub step: RenderStep,
    pub message: String,
    pub details: String,
}

fn details_suffix(details: &str) -> String {
    if details.is_empty() {
        String::new()
    } else {
        format!("\n   Details: {details}")
    }
}

impl RenderError {
    pub fn new(step: RenderStep, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
            details: details.into(),
        }
    }

    /// Default response when no error handler is registered: JSON 500.
    pub fn to_response(&self, page: &Page) -> HandlerResponse {
        let mut body = json!({
            "error": self.to_string(),
            "page": page.route,
        });
        if self.step.names_file() {
            body["file"] = json!(page.file.to_string_lossy());
        }
        HandlerResponse::json(500, &body)
    }
}

const JS_HINTS: &[(&str, &str)] = &[
    (
        "ReferenceError",
        "Undefined variable or function - check imports and component exports",
    ),
    (
        "TypeError",
        "Type error in component - check that props match expected types",
    ),
    ("SyntaxError", "Syntax error in component - check TSX/JSX syntax"),
    (
        "Cannot read",
        "Trying to access property on null/undefined - check prop values",
    ),
];

const JS_HINT_LIMIT: usize = 200;

/// One-line hint for a JS engine error, or the message truncated.
pub fn js_error_hint(raw: &str) -> String {
    let raw = raw.trim();
    JS_HINTS
        .iter()
        .find(|(needle, _)| raw.contains(needle))
        .map(|(_, hint)| (*hint).to_string())
        .unwrap_or_else(|| truncate(raw, JS_HINT_LIMIT))
}
