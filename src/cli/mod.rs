//! cli
//!
//! Command-line interface layer for stagehand.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT drive deployments directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! command handlers, which wire the [`crate::release`] pipeline together.
//! All chain effects flow through that pipeline.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::Result;

use crate::ui::output::Verbosity;

/// Global flags shared by every command handler.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit project config path from `--config`, if any.
    pub config: Option<PathBuf>,
    /// Output verbosity from `--quiet`/`--debug`.
    pub verbosity: Verbosity,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        config: cli.config.clone(),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command, &ctx)
}
