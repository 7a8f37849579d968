//! Command-line interface module.

mod args;
pub mod build;
pub mod dev;
pub mod serve;

pub use args::{Cli, Commands, ProjectArgs};

use anyhow::Result;

use crate::engine::EngineBuilder;

/// Run `command` against a configured engine builder.
///
/// Hosts embedding kiln register their loaders and handlers on the builder
/// and hand it here, so the CLI serves their pages with their callbacks.
pub fn run(command: &Commands, builder: EngineBuilder) -> Result<()> {
    match command {
        Commands::Dev { .. } => dev::run(builder),
        Commands::Build { .. } => build::run(builder),
        Commands::Serve { .. } => serve::run(builder),
    }
}
