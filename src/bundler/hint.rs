//! Turning raw esbuild output into something a person can act on.

use crate::utils::exec::strip_ansi;

const BUILD_HINTS: &[(&str, &str)] = &[
    (
        "Cannot find module",
        "Import error: Check that imported modules exist and are installed",
    ),
    ("Module not found", "Module import error: Check npm dependencies"),
    ("SyntaxError", "TypeScript/JSX syntax error: Check component syntax"),
    ("Unexpected token", "Parsing error: Invalid syntax in component"),
    ("Invalid JSX", "Invalid JSX: Check component JSX syntax"),
];

const BUILD_HINT_LIMIT: usize = 150;

/// One-line hint for a build failure, or the message truncated.
pub fn build_error_hint(raw: &str) -> String {
    let raw = raw.trim();
    BUILD_HINTS
        .iter()
        .find(|(needle, _)| raw.contains(needle))
        .map(|(_, hint)| (*hint).to_string())
        .unwrap_or_else(|| truncate(raw, BUILD_HINT_LIMIT))
}

/// `limit` characters of `s`, with `...` appended when anything was cut.
pub fn truncate(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

/// Join the errors of one build.
pub fn format_build_errors(errors: &[String]) -> String {
    match errors {
        [] => "unknown error".to_string(),
        [one] => one.clone(),
        many => {
            let mut text = format!("{} errors:\n", many.len());
            for (i, error) in many.iter().enumerate() {
                text.push_str(&format!("{}. {}\n", i + 1, error));
            }
            text
        }
    }
}

/// Messages of the `✘ [ERROR] ...` lines esbuild writes to stderr.
///
/// Falls back to the whole (trimmed) output when no such line exists, so a
/// crash of the tool itself still reports something.
pub fn parse_esbuild_errors(stderr: &str) -> Vec<String> {
    let errors: Vec<String> = stderr
        .lines()
        .map(strip_ansi)
        .filter_map(|line| {
            line.split_once("[ERROR]")
                .map(|(_, message)| message.trim().to_string())
        })
        .filter(|message| !message.is_empty())
        .collect();

    if !errors.is_empty() {
        return errors;
    }

    let rest = strip_ansi(stderr).trim().to_string();
    if rest.is_empty() { Vec::new() } else { vec![rest] }
}
