//! kiln command-line entry point.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use kiln::{
    cli::{self, Cli},
    config::KilnConfig,
    core,
    engine::Engine,
};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = KilnConfig::load(&cli)?;
    cli::run(&cli.command, Engine::builder(config))
}
