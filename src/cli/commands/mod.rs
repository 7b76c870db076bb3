//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves its inputs (CLI flags over config values)
//! 2. Wires the release pipeline together and runs it
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that talk to a node (release, addresses) are async because
//! they involve network I/O. Each exposes a synchronous wrapper that
//! builds a tokio runtime and blocks on the async implementation.

mod addresses;
mod completion;
mod release;

// Re-export command functions for testing and direct invocation
pub use addresses::addresses;
pub use completion::completion;
pub use release::release;

use anyhow::Result;

use crate::cli::args::Command;
use crate::cli::Context;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Release {
            report,
            libraries,
            build_dir,
            init_args,
            rpc_url,
            from,
            registry,
            dry_run,
            output,
        } => release::release(
            ctx,
            &report,
            libraries.as_deref(),
            build_dir.as_deref(),
            init_args.as_deref(),
            rpc_url.as_deref(),
            from.as_deref(),
            registry.as_deref(),
            dry_run,
            &output,
        ),
        Command::Addresses {
            libraries,
            rpc_url,
            registry,
        } => addresses::addresses(
            ctx,
            libraries.as_deref(),
            rpc_url.as_deref(),
            registry.as_deref(),
        ),
        Command::Completion { shell } => completion::completion(shell),
    }
}
