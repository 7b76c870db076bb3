//! cli::commands::addresses
//!
//! Print the current address of every catalog unit.
//!
//! # Design
//!
//! Seeds an address table exactly the way a release run would, then
//! prints the entries. Units without a registry entry (zero address) and
//! without a library-mapping entry are listed as unregistered so the
//! operator can see what a release would fail to link against.
//!
//! # Example
//!
//! ```bash
//! stagehand addresses
//! stagehand addresses --libraries libraries.json
//! ```

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::chain::JsonRpcChain;
use crate::cli::Context;
use crate::core::config::Config;
use crate::core::types::Address;
use crate::release::{AddressTable, LibraryMapping};
use crate::ui::output;

/// Run the addresses command.
///
/// This is a synchronous wrapper that uses tokio to run the async
/// implementation.
pub fn addresses(
    ctx: &Context,
    libraries: Option<&Path>,
    rpc_url: Option<&str>,
    registry: Option<&str>,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(addresses_async(ctx, libraries, rpc_url, registry))
}

/// Async implementation of addresses.
async fn addresses_async(
    ctx: &Context,
    libraries: Option<&Path>,
    rpc_url: Option<&str>,
    registry: Option<&str>,
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
             (or pass --config) first"
        );
    }

    let libraries = match libraries {
        Some(path) => LibraryMapping::load(path)?,
        None => LibraryMapping::default(),
    };

    let rpc_url = rpc_url.unwrap_or_else(|| config.rpc_url());
    let from = config.from_address()?.unwrap_or_else(Address::zero);
    let registry = match registry {
        Some(raw) => Address::from_hex(raw).context("invalid --registry address")?,
        None => config.registry()?,
    };

    let chain = JsonRpcChain::new(rpc_url, from, registry);

    let mut table = AddressTable::new();
    table
        .seed(catalog.names().cloned(), &chain, &libraries)
        .await?;

    for name in catalog.names() {
        match table.get(name) {
            Ok(address) => {
                output::print(format!("{:<28} {}", name.as_str(), address.to_hex()), verbosity);
            }
            Err(_) => {
                output::print(format!("{:<28} (unregistered)", name.as_str()), verbosity);
            }
        }
    }

    Ok(())
}
