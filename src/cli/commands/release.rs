//! cli::commands::release
//!
//! Compute and stage a release from a compatibility report.
//!
//! # Design
//!
//! The handler resolves every input (CLI flags over config values), takes
//! the build-directory lock, seeds the address table from the registry,
//! and hands the walk to the orchestrator. Implementations deploy as the
//! walk runs; the resulting proposal is previewed on stdout and persisted
//! atomically to the output path.
//!
//! The run is fail-fast. A deployment that already reached the chain
//! before a later step failed is not rolled back; rerunning after a fix
//! deploys fresh implementations.
//!
//! # Example
//!
//! ```bash
//! # Stage a release
//! stagehand release --report report.json --build-dir build/contracts
//!
//! # Rehearse first
//! stagehand release --report report.json --dry-run
//! ```

use std::fs;
use std::io::Write as _;
use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::abi::InitArgs;
use crate::chain::JsonRpcChain;
use crate::cli::Context;
use crate::core::artifact::UnitSet;
use crate::core::config::Config;
use crate::core::graph::DependencyGraph;
use crate::core::report::ChangeReport;
use crate::core::types::Address;
use crate::release::{AddressTable, Deployer, LibraryMapping, Orchestrator, RunLock};
use crate::ui::output;

/// Run the release command.
///
/// This is a synchronous wrapper that uses tokio to run the async
/// implementation.
#[allow(clippy::too_many_arguments)]
pub fn release(
    ctx: &Context,
    report: &Path,
    libraries: Option<&Path>,
    build_dir: Option<&Path>,
    init_args: Option<&Path>,
    rpc_url: Option<&str>,
    from: Option<&str>,
    registry: Option<&str>,
    dry_run: bool,
    output_path: &Path,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(release_async(
        ctx,
        report,
        libraries,
        build_dir,
        init_args,
        rpc_url,
        from,
        registry,
        dry_run,
        output_path,
    ))
}

/// Async implementation of release.
#[allow(clippy::too_many_arguments)]
async fn release_async(
    ctx: &Context,
    report: &Path,
    libraries: Option<&Path>,
    build_dir: Option<&Path>,
    init_args: Option<&Path>,
    rpc_url: Option<&str>,
    from: Option<&str>,
    registry: Option<&str>,
    dry_run: bool,
    output_path: &Path,
) -> Result<()> {
    let verbosity = ctx.verbosity;

    let project_dir = std::env::current_dir().context("failed to resolve working directory")?;
    let loaded = Config::load(ctx.config.as_deref(), &project_dir)?;
    for warning in &loaded.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            verbosity,
        );
    }
    let config = loaded.config;

    let catalog = config.catalog()?;
    if catalog.is_empty() {
        bail!(
            "the unit catalog is empty; declare [[units]] in stagehand.toml \
             (or pass --config) before releasing"
        );
    }

    let build_dir = build_dir
        .map(Path::to_path_buf)
        .or_else(|| config.build_dir().map(Path::to_path_buf))
        .context("no build directory: pass --build-dir or set build_dir in stagehand.toml")?;

    let units = UnitSet::load_dir(&build_dir, &catalog)?;
    output::debug(
        format!("loaded {} artifact(s) from {}", units.len(), build_dir.display()),
        verbosity,
    );

    // Held for the rest of the run; released on drop.
    let _lock = RunLock::acquire(&build_dir)?;

    let report = ChangeReport::load(report)?;
    let libraries = match libraries {
        Some(path) => LibraryMapping::load(path)?,
        None => LibraryMapping::default(),
    };
    let init_args = match init_args {
        Some(path) => InitArgs::load(path)?,
        None => InitArgs::default(),
    };

    let rpc_url = rpc_url.unwrap_or_else(|| config.rpc_url());
    let from = match from {
        Some(raw) => Address::from_hex(raw).context("invalid --from address")?,
        None => config.from_address()?.unwrap_or_else(Address::zero),
    };
    let registry = match registry {
        Some(raw) => Address::from_hex(raw).context("invalid --registry address")?,
        None => config.registry()?,
    };

    let chain = JsonRpcChain::new(rpc_url, from, registry);
    output::debug(format!("chain backend: {}", rpc_url), verbosity);

    if dry_run {
        output::print(
            "dry run: deployments use stand-in addresses and nothing is sent",
            verbosity,
        );
    }

    let graph = DependencyGraph::from_units(&units);

    let mut table = AddressTable::new();
    table
        .seed(catalog.names().cloned(), &chain, &libraries)
        .await?;
    output::debug(format!("seeded {} address(es)", table.len()), verbosity);

    let deployer = Deployer::new(&chain, &units).dry_run(dry_run);
    let mut orchestrator =
        Orchestrator::new(&units, &graph, &report, &init_args, &mut table, deployer);

    let roots = catalog.release_roots();
    orchestrator.release_all(&roots).await?;
    let outcome = orchestrator.finish();

    {
        let order: Vec<&str> = outcome.released.iter().map(|n| n.as_str()).collect();
        output::debug(format!("release order: {}", order.join(", ")), verbosity);
    }
    for warning in &outcome.warnings {
        output::warn(warning, verbosity);
    }

    output::print(outcome.proposal.preview(), verbosity);
    output::print(
        format!("proposal digest: {}", outcome.proposal.digest()),
        verbosity,
    );

    let json = outcome.proposal.to_json()?;
    write_atomic(output_path, &json)
        .with_context(|| format!("failed to write proposal to {}", output_path.display()))?;
    output::success(
        format!(
            "wrote {} transaction(s) to {}",
            outcome.proposal.len(),
            output_path.display()
        ),
        verbosity,
    );

    Ok(())
}

/// Write the proposal file atomically: temp file in the same directory,
/// fsync, then rename over the target.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(contents.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}
