//! Terminal output.
//!
//! - `log!`/`debug!`: one line with a colored `[module]` prefix
//! - status block: the dev watchers' latest rebuild result, redrawn in place
//! - [`ProgressLine`]: the `kiln build` page counter
//!
//! ```ignore
//! log!("serve"; "http://{}", addr);
//! debug!("esbuild"; "client bundle for {}", file);
//! status_error("pages/index.tsx: server bundle error", &hint);
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set from `--verbose`.
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Set while a [`ProgressLine`] owns the current terminal line.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

/// `log!("module"; "format {}", args)`
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, printed only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Print `[module] message`. A running progress line is redrawn below it.
pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    writeln!(out, "{} {message}", prefix(module)).ok();
    if PROGRESS_ACTIVE.load(Ordering::Relaxed) {
        // the counter reappears on its next increment
        writeln!(out).ok();
    }
    out.flush().ok();
}

fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => tag.bright_blue().bold().to_string(),
        "watch" | "reload" => tag.bright_green().bold().to_string(),
        "build" => tag.bright_cyan().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Dev status block
// ============================================================================

/// Height of the last status block, so the next one can replace it.
static STATUS_LINES: Mutex<usize> = Mutex::new(0);

/// UTC wall clock as `HH:MM:SS`.
fn clock(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", (secs / 3600) % 24, (secs / 60) % 60, secs % 60)
}

fn show_status(symbol: String, message: &str) {
    let mut lines = STATUS_LINES.lock();
    let mut out = stdout().lock();

    if *lines > 0 {
        let up = u16::try_from(*lines).unwrap_or(u16::MAX);
        execute!(out, cursor::MoveUp(up), Clear(ClearType::FromCursorDown)).ok();
    }

    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let stamp = format!("[{}]", clock(secs)).dimmed().to_string();
    writeln!(out, "{stamp} {symbol} {message}").ok();
    out.flush().ok();

    *lines = message.lines().count().max(1);
}

/// A page rebuilt or the route table changed.
pub fn status_success(message: &str) {
    show_status("✓".green().to_string(), message);
}

/// A build or discovery failure, with the bundler's hint below it.
pub fn status_error(summary: &str, detail: &str) {
    let message = if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    };
    show_status("✗".red().to_string(), &message);
}

/// esbuild warnings for a build that otherwise succeeded.
pub fn status_warning(detail: &str) {
    show_status("⚠".yellow().to_string(), detail);
}

// ============================================================================
// Build progress
// ============================================================================

/// `[build] pages(7/12)`, updated in place from rayon workers.
pub struct ProgressLine {
    label: &'static str,
    total: usize,
    done: AtomicUsize,
    redraw: Mutex<()>,
}

impl ProgressLine {
    pub fn new(label: &'static str, total: usize) -> Self {
        PROGRESS_ACTIVE.store(true, Ordering::Relaxed);
        let progress = Self {
            label,
            total,
            done: AtomicUsize::new(0),
            redraw: Mutex::new(()),
        };
        progress.draw(false);
        progress
    }

    /// Count one finished page. Skips the redraw when another worker is
    /// drawing; the final count is printed by `finish`.
    pub fn inc(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.redraw.try_lock() {
            self.draw(false);
        }
    }

    fn line(&self) -> String {
        format!("{}({}/{})", self.label, self.done.load(Ordering::Relaxed), self.total)
    }

    fn draw(&self, last: bool) {
        let mut out = stdout().lock();
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        write!(out, "{} {}", prefix("build"), self.line()).ok();
        if last {
            writeln!(out).ok();
        }
        out.flush().ok();
    }

    /// Leave the final count on screen.
    pub fn finish(self) {
        let _guard = self.redraw.lock();
        PROGRESS_ACTIVE.store(false, Ordering::Relaxed);
        self.draw(true);
    }
}
