//! Running the external build tools.
//!
//! esbuild and Tailwind are configured as argv vectors (`["esbuild"]`,
//! `["npx", "esbuild"]`), so a [`Cmd`] always starts from a slice:
//!
//! ```ignore
//! // one-shot: the caller parses esbuild's errors itself
//! let out = Cmd::from_slice(&config.build.esbuild).args(args).cwd(root).output()?;
//!
//! // Tailwind: failure is an error, progress chatter is dropped
//! Cmd::from_slice(&tailwind).arg("-i").arg(input).filter(&TAILWIND_FILTER).run()?;
//!
//! // watch mode: caller owns the child and reads its stderr
//! let child = Cmd::from_slice(&config.build.esbuild).arg("--watch=forever").spawn()?;
//! ```

use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Child, Command, Output, Stdio},
    sync::OnceLock,
};

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::log;

/// External tool invocation.
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    filter: &'static OutputFilter,
}

impl Cmd {
    /// First element is the program, the rest are leading arguments.
    pub fn from_slice<S: AsRef<OsStr>>(argv: &[S]) -> Self {
        let mut argv = argv.iter().map(|s| s.as_ref().to_owned());
        Self {
            program: argv.next().unwrap_or_default(),
            args: argv.collect(),
            cwd: None,
            filter: &OutputFilter::NONE,
        }
    }

    /// Append one argument. Empty strings are skipped, so optional flags
    /// can be passed as `if cond { "--minify" } else { "" }`.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        args.into_iter().fold(self, Cmd::arg)
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Lines to drop when relaying the tool's stderr.
    pub fn filter(mut self, filter: &'static OutputFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run to completion. A non-zero exit is an error carrying the relevant
    /// stderr lines; on success those lines are logged under the tool's name.
    pub fn run(self) -> Result<Output> {
        let (name, filter) = (self.program_name(), self.filter);
        let output = self.output()?;
        let stderr = filter.relevant(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            let mut message = format!("`{name}` exited with {}", output.status);
            if !stderr.is_empty() {
                message.push('\n');
                message.push_str(&stderr.join("\n"));
            }
            bail!(message);
        }
        if !stderr.is_empty() {
            log!(&name; "{}", stderr.join("\n"));
        }
        Ok(output)
    }

    /// Run to completion and hand back the output whatever the exit status.
    pub fn output(self) -> Result<Output> {
        self.command()
            .output()
            .with_context(|| format!("Failed to execute `{}`", self.program_name()))
    }

    /// Start a long-lived child with piped stderr. The caller kills it.
    pub fn spawn(self) -> Result<Child> {
        self.command()
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn `{}`", self.program_name()))
    }
}

/// Prefixes of progress lines a tool prints on every run.
pub struct OutputFilter {
    noise: &'static [&'static str],
}

impl OutputFilter {
    pub const NONE: Self = Self::new(&[]);

    pub const fn new(noise: &'static [&'static str]) -> Self {
        Self { noise }
    }

    pub fn is_noise(&self, line: &str) -> bool {
        line.is_empty() || self.noise.iter().any(|p| line.starts_with(p))
    }

    /// Trimmed, uncolored lines of `output` that aren't noise.
    pub fn relevant(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .map(|line| strip_ansi(line).trim().to_string())
            .filter(|line| !self.is_noise(line))
            .collect()
    }
}

/// Remove terminal color codes (esbuild colors its diagnostics).
pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    match RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").ok()) {
        Some(re) => re.replace_all(s, ""),
        None => Cow::Borrowed(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_splits_program() {
        let cmd = Cmd::from_slice(&["npx", "esbuild"])
            .arg("entry.tsx")
            .args(["--bundle", "", "--minify"])
            .cwd("/tmp");
        assert_eq!(cmd.program_name(), "npx");
        assert_eq!(cmd.args, ["esbuild", "entry.tsx", "--bundle", "--minify"]);
        assert_eq!(cmd.cwd, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_empty_argv() {
        let cmd = Cmd::from_slice::<&str>(&[]);
        assert_eq!(cmd.program_name(), "");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_filter_drops_noise() {
        const TAILWIND: OutputFilter = OutputFilter::new(&["≈ tailwindcss", "Done in"]);
        assert!(TAILWIND.is_noise("≈ tailwindcss v4.1.0"));
        assert!(TAILWIND.is_noise("Done in 41ms"));
        assert!(TAILWIND.is_noise(""));
        assert!(!TAILWIND.is_noise("Error: Cannot apply unknown utility class"));

        let kept = TAILWIND.relevant("\x1b[2m≈ tailwindcss v4\x1b[0m\n\n  \x1b[31mboom\x1b[0m  \n");
        assert_eq!(kept, vec!["boom".to_string()]);
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31m✘ [ERROR]\x1b[0m x"), "✘ [ERROR] x");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[cfg(unix)]
    #[test]
    fn test_output_keeps_failure() {
        let output = Cmd::from_slice(&["sh", "-c", "echo nope >&2; exit 2"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(2));
        assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "nope");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_failure_carries_stderr() {
        const FILTER: OutputFilter = OutputFilter::new(&["progress"]);
        let err = Cmd::from_slice(&["sh", "-c", "echo progress >&2; echo broken >&2; exit 3"])
            .filter(&FILTER)
            .run()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("`sh` exited with"), "{msg}");
        assert!(msg.ends_with("\nbroken"), "{msg}");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_success() {
        let output = Cmd::from_slice(&["sh", "-c", "echo hello"]).run().unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }
}
