//! Server bundle evaluation.
//!
//! Each call builds a fresh engine context, evaluates the bundle, calls
//! `renderPage` and drops the context. Nothing survives between renders.

use boa_engine::{Context, JsError, Source};

/// Upper bounds for one render, so a runaway component fails the request
/// instead of hanging a worker.
const LOOP_ITERATION_LIMIT: u64 = 1_000_000;
const RECURSION_LIMIT: usize = 2_048;

/// Evaluate `bundle` and return `renderPage(props)` as a string.
///
/// `props_json` must be a JSON document; it is passed through `JSON.parse`
/// so it is never interpreted as code.
pub fn render_to_string(bundle: &str, props_json: &str) -> Result<String, String> {
    let mut ctx = Context::default();
    ctx.runtime_limits_mut()
        .set_loop_iteration_limit(LOOP_ITERATION_LIMIT);
    ctx.runtime_limits_mut().set_recursion_limit(RECURSION_LIMIT);

    ctx.eval(Source::from_bytes(bundle))
        .map_err(|e| describe(&e, &mut ctx))?;

    let literal = serde_json::to_string(props_json).map_err(|e| e.to_string())?;
    let call = format!(
        "if (typeof globalThis.renderPage !== 'function') {{ \
           throw new ReferenceError('renderPage is not defined by the server bundle'); \
         }} \
         globalThis.renderPage(JSON.parse({literal}));"
    );
    let value = ctx
        .eval(Source::from_bytes(&call))
        .map_err(|e| describe(&e, &mut ctx))?;

    value
        .to_string(&mut ctx)
        .map(|s| s.to_std_string_escaped())
        .map_err(|e| describe(&e, &mut ctx))
}

/// `Name: message` for thrown errors, the display form otherwise.
fn describe(err: &JsError, ctx: &mut Context) -> String {
    match err.try_native(ctx) {
        Ok(native) => native.to_string(),
        Err(_) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"
        globalThis.renderPage = function renderPage(props) {
            return "<h1>Hello " + (props.name || "world") + "</h1>";
        };
    "#;

    #[test]
    fn test_renders_with_props() {
        assert_eq!(render_to_string(BUNDLE, "{}").unwrap(), "<h1>Hello world</h1>");
        assert_eq!(
            render_to_string(BUNDLE, r#"{"name":"kiln"}"#).unwrap(),
            "<h1>Hello kiln</h1>"
        );
    }

    #[test]
    fn test_props_are_data_not_code() {
        let props = serde_json::json!({ "name": "\"); throw 1; (\"" }).to_string();
        assert_eq!(
            render_to_string(BUNDLE, &props).unwrap(),
            "<h1>Hello \"); throw 1; (\"</h1>"
        );
    }

    #[test]
    fn test_missing_render_function() {
        let err = render_to_string("var x = 1;", "{}").unwrap_err();
        assert!(err.contains("ReferenceError"), "{err}");
    }

    #[test]
    fn test_thrown_errors_keep_their_name() {
        let bundle = "globalThis.renderPage = function () { return undefinedThing.x; };";
        let err = render_to_string(bundle, "{}").unwrap_err();
        assert!(err.contains("ReferenceError"), "{err}");

        let bundle = "globalThis.renderPage = function (p) { return p.user.name; };";
        let err = render_to_string(bundle, "{}").unwrap_err();
        assert!(err.contains("TypeError"), "{err}");
    }

    #[test]
    fn test_syntax_error_in_bundle() {
        let err = render_to_string("globalThis.renderPage = function ( {", "{}").unwrap_err();
        assert!(err.contains("SyntaxError"), "{err}");
    }

    #[test]
    fn test_no_state_leaks_between_renders() {
        let bundle = r#"
            globalThis.renderPage = function () {
                globalThis.count = (globalThis.count || 0) + 1;
                return String(globalThis.count);
            };
        "#;
        assert_eq!(render_to_string(bundle, "{}").unwrap(), "1");
        assert_eq!(render_to_string(bundle, "{}").unwrap(), "1");
    }

    #[test]
    fn test_runaway_loop_is_an_error() {
        let bundle = "globalThis.renderPage = function () { while (true) {} };";
        assert!(render_to_string(bundle, "{}").is_err());
    }
}
