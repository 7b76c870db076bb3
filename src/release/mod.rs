//! release
//!
//! The release pipeline: everything between parsed inputs and a
//! finished proposal.
//!
//! # Architecture
//!
//! A run wires the pieces together in a fixed order. The [`RunLock`]
//! guards the build directory against concurrent runs. The
//! [`AddressTable`] is seeded from the on-chain registry plus any
//! off-registry library mapping. The [`Orchestrator`] then walks the
//! dependency graph, using the [`Deployer`] for everything that goes
//! straight to the chain and a [`ProposalBuilder`] for everything that
//! must wait for a governance vote.
//!
//! State never flows backwards: the table is only written by seeding
//! and by released units, and the proposal is append-only.
//!
//! # Modules
//!
//! - [`table`]: current address per unit, seeded then run-maintained
//! - [`proposal`]: ordered governance transactions and their JSON form
//! - [`deployer`]: chain-facing deploys, with a dry-run stand-in mode
//! - [`orchestrator`]: the dependency-ordered walk and release decision
//! - [`lock`]: one-run-at-a-time guard on the build directory
//!
//! # Example
//!
//! ```ignore
//! use stagehand::release::{AddressTable, Deployer, Orchestrator, RunLock};
//!
//! let _lock = RunLock::acquire(&build_dir)?;
//!
//! let mut table = AddressTable::new();
//! table.seed(units.names().cloned(), &chain, &libraries).await?;
//!
//! let deployer = Deployer::new(&chain, &units).dry_run(dry_run);
//! let mut orchestrator =
//!     Orchestrator::new(&units, &graph, &report, &init_args, &mut table, deployer);
//! orchestrator.release_all(&roots).await?;
//!
//! let outcome = orchestrator.finish();
//! println!("{}", outcome.proposal.preview());
//! ```

pub mod deployer;
pub mod lock;
pub mod orchestrator;
pub mod proposal;
pub mod table;

pub use deployer::{DeployError, Deployer};
pub use lock::{LockError, RunLock};
pub use orchestrator::{Orchestrator, ReleaseError, ReleaseOutcome, ReleaseState, ReleaseWarning};
pub use proposal::{ProposalBuilder, ProposalTx};
pub use table::{AddressTable, LibraryMapping, TableError};
