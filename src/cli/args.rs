//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Explicit project config file
//! - `--debug`: Enable debug output
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stagehand - dependency-aware contract release orchestration
#[derive(Parser, Debug)]
#[command(name = "stagehand")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the project config file (default: stagehand.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute and stage a release from a compatibility report
    #[command(
        name = "release",
        long_about = "Compute and stage a release from a compatibility report.\n\n\
            Reads the report, loads compiled artifacts from the build directory, \
            seeds current addresses from the on-chain registry, then walks the \
            dependency graph releasing every changed unit in dependency order. \
            Implementations deploy immediately; everything that must pass a \
            governance vote is appended to an ordered proposal file instead.\n\n\
            The run is fail-fast: the first error aborts it, and deployments \
            already on chain are not rolled back.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Stage a release from a report, writing proposal.json
    stagehand release --report report.json --build-dir build/contracts

    # Rehearse without touching the chain (stand-in addresses)
    stagehand release --report report.json --dry-run

    # Off-registry library addresses from the last release manifest
    stagehand release --report report.json --libraries libraries.json

    # Initializer arguments for contracts that need them
    stagehand release --report report.json --init-args init.json

    # Everything explicit, no config file
    stagehand release --report report.json \\
        --build-dir build/contracts \\
        --rpc-url http://127.0.0.1:8545 \\
        --from 0x5409ed021d9299bf6814279a6a1411a7e866a631 \\
        --registry 0x000000000000000000000000000000000000ce10 \\
        --output proposal.json

TYPICAL RELEASE:
    1. Run the compatibility checker against the last released build
    2. stagehand release --report report.json --dry-run   # review the plan
    3. stagehand release --report report.json             # deploy + stage
    4. Submit proposal.json through the governance pipeline"
    )]
    Release {
        /// Path to the compatibility report JSON
        #[arg(long, value_name = "PATH")]
        report: PathBuf,

        /// Path to a trusted library address mapping JSON
        #[arg(long, value_name = "PATH")]
        libraries: Option<PathBuf>,

        /// Directory of compiled artifact JSON files
        #[arg(long, value_name = "PATH")]
        build_dir: Option<PathBuf>,

        /// Path to per-unit initializer arguments JSON
        #[arg(long, value_name = "PATH")]
        init_args: Option<PathBuf>,

        /// JSON-RPC endpoint (overrides config)
        #[arg(long, value_name = "URL")]
        rpc_url: Option<String>,

        /// Sender account for deployments (overrides config)
        #[arg(long, value_name = "ADDRESS")]
        from: Option<String>,

        /// Registry contract address (overrides config)
        #[arg(long, value_name = "ADDRESS")]
        registry: Option<String>,

        /// Compute the full release without sending anything
        #[arg(long)]
        dry_run: bool,

        /// Where to write the proposal JSON
        #[arg(long, value_name = "PATH", default_value = "proposal.json")]
        output: PathBuf,
    },

    /// Print the current address of every catalog unit
    #[command(
        name = "addresses",
        long_about = "Print the current on-chain address of every unit in the catalog.\n\n\
            Seeds an address table exactly the way a release run would: one \
            registry lookup per catalog unit, with unregistered units (zero \
            address) omitted, then the trusted library mapping overlaid on top. \
            Useful for checking what a release would link against before \
            running one.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Show registered addresses
    stagehand addresses

    # Include off-registry library addresses
    stagehand addresses --libraries libraries.json

    # Ask a different node
    stagehand addresses --rpc-url https://forno.celo.org

BEFORE A RELEASE:
    stagehand addresses          # confirm the registry state looks sane
    stagehand release --report report.json --dry-run"
    )]
    Addresses {
        /// Path to a trusted library address mapping JSON
        #[arg(long, value_name = "PATH")]
        libraries: Option<PathBuf>,

        /// JSON-RPC endpoint (overrides config)
        #[arg(long, value_name = "URL")]
        rpc_url: Option<String>,

        /// Registry contract address (overrides config)
        #[arg(long, value_name = "ADDRESS")]
        registry: Option<String>,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for stagehand \
            commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    stagehand completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    stagehand completion zsh >> ~/.zshrc

    # Fish
    stagehand completion fish > ~/.config/fish/completions/stagehand.fish

    # PowerShell
    stagehand completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
