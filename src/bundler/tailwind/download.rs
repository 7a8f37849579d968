//! On-demand download of the standalone Tailwind CLI.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use super::super::BuildError;
use crate::log;

const RELEASE_URL: &str = "https://github.com/tailwindlabs/tailwindcss/releases/latest/download";

/// Release asset suffix for a host, `None` when no binary is published.
pub fn platform_asset(os: &str, arch: &str) -> Option<&'static str> {
    match (os, arch) {
        ("windows", "x86_64") => Some("windows-x64.exe"),
        ("linux", "aarch64") => Some("linux-arm64"),
        ("linux", "x86_64") => Some("linux-x64"),
        ("macos", "aarch64") => Some("macos-arm64"),
        ("macos", "x86_64") => Some("macos-x64"),
        _ => None,
    }
}

/// Download URL for the running host.
pub fn download_url() -> Result<String, BuildError> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    platform_asset(os, arch)
        .map(|asset| format!("{RELEASE_URL}/tailwindcss-{asset}"))
        .ok_or_else(|| BuildError::Tailwind(format!("unsupported platform: {os}/{arch}")))
}

/// Where the binary lives inside the tools directory.
pub fn binary_path(tools_dir: &Path) -> PathBuf {
    tools_dir.join(if cfg!(windows) { "tailwindcss.exe" } else { "tailwindcss" })
}

/// Path to the binary, downloading it when missing.
pub fn ensure_binary(tools_dir: &Path) -> Result<PathBuf, BuildError> {
    let path = binary_path(tools_dir);
    if path.is_file() {
        return Ok(path);
    }

    let url = download_url()?;
    log!("tailwind"; "downloading {}", url);
    let bytes = fetch(&url)?;

    let io_err = |source| BuildError::Io {
        path: path.clone(),
        source,
    };
    fs::create_dir_all(tools_dir).map_err(io_err)?;

    // never leave a truncated binary at the final path
    let partial = path.with_extension("part");
    let mut file = fs::File::create(&partial).map_err(io_err)?;
    file.write_all(&bytes).map_err(io_err)?;
    drop(file);
    make_executable(&partial).map_err(io_err)?;
    fs::rename(&partial, &path).map_err(io_err)?;

    log!("tailwind"; "downloaded to {}", path.display());
    Ok(path)
}

fn fetch(url: &str) -> Result<Vec<u8>, BuildError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(300))
        .user_agent(concat!("kiln/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| BuildError::Tailwind(format!("failed to create HTTP client: {e}")))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| BuildError::Tailwind(format!("failed to download tailwind from {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(BuildError::Tailwind(format!(
            "tailwind download failed with status {}",
            response.status()
        )));
    }

    response
        .bytes()
        .map(|b| b.to_vec())
        .map_err(|e| BuildError::Tailwind(format!("failed to read tailwind download: {e}")))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
