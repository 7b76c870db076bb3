//! release::orchestrator
//!
//! The dependency-ordered release walk.
//!
//! # Architecture
//!
//! Every traversal root (proxied core contracts from the catalog) is
//! released with a recursive post-order walk: dependencies first, then
//! the unit itself. Each unit is visited at most once per run; a unit
//! re-entered while still in progress means the build's link references
//! form a cycle, which is fatal rather than an infinite walk.
//!
//! Releasing a unit means:
//!
//! 1. Link its bytecode against the address table, which at that point
//!    already holds every dependency's current address.
//! 2. Classify it with the compatibility report and act:
//!    - changed library: deploy it and update the table so later
//!      dependents link against the new address
//!    - changed core contract: the deployment decision below
//!    - unchanged: nothing; the seeded address stays authoritative
//!
//! # Deployment decision
//!
//! A changed core contract always gets a fresh implementation. Whether
//! its proxy survives depends on the report:
//!
//! - storage layout intact and not a new unit: keep the proxy; one
//!   `setImplementation` proposal transaction, plus a warning, because
//!   the contract's state carries over and the operator should know
//!   this release rides on an existing proxy
//! - otherwise: new proxy, owned by Governance from the moment it
//!   exists; the registry is repointed before the implementation is
//!   installed, and an initializer (when the contract has one) is folded
//!   into the install transaction so no intermediate state is reachable
//!
//! Replacing the `Governance` proxy itself is forbidden: governance owns
//! every other proxy, and a replacement would be an ownership transfer
//! that never passed a vote.
//!
//! # Invariants
//!
//! - `release(x)` after `release(x)` is a no-op
//! - Every dependency is fully released before its dependent links
//! - Proposal transactions are appended in execution order and never
//!   reordered
//!
//! # Example
//!
//! ```
//! use stagehand::abi::InitArgs;
//! use stagehand::chain::mock::MockChain;
//! use stagehand::core::artifact::{Artifact, Unit, UnitSet};
//! use stagehand::core::graph::DependencyGraph;
//! use stagehand::core::report::ChangeReport;
//! use stagehand::core::types::{UnitKind, UnitName};
//! use stagehand::release::{AddressTable, Deployer, Orchestrator};
//!
//! # tokio_test::block_on(async {
//! let artifact = Artifact::from_json_str(
//!     r#"{"contractName": "LinkedList", "abi": [], "bytecode": "0x6060"}"#,
//! )
//! .unwrap();
//! let mut units = UnitSet::default();
//! units.insert_unit(Unit {
//!     name: UnitName::new("LinkedList").unwrap(),
//!     kind: UnitKind::Library,
//!     artifact,
//! });
//!
//! let graph = DependencyGraph::from_units(&units);
//! let report = ChangeReport::from_json_str(
//!     r#"{"libraries": {"LinkedList": {"changes": {"major": [{"type": "NewContract"}]}}}}"#,
//! )
//! .unwrap();
//! let init_args = InitArgs::default();
//! let mut table = AddressTable::new();
//! let chain = MockChain::new();
//!
//! let deployer = Deployer::new(&chain, &units);
//! let mut orchestrator =
//!     Orchestrator::new(&units, &graph, &report, &init_args, &mut table, deployer);
//!
//! let list = UnitName::new("LinkedList").unwrap();
//! orchestrator.release(&list).await.unwrap();
//!
//! let outcome = orchestrator.finish();
//! assert!(outcome.proposal.is_empty());
//! assert_eq!(outcome.released, vec![list.clone()]);
//! assert_eq!(table.get(&list).unwrap(), MockChain::deployed_address(1));
//! # });
//! ```

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;

use crate::abi::{self, EncodeError, InitArgs};
use crate::core::artifact::{ArtifactError, Unit, UnitSet};
use crate::core::catalog::UnitCatalog;
use crate::core::graph::DependencyGraph;
use crate::core::report::ChangeReport;
use crate::core::types::{Address, UnitKind, UnitName};
use crate::release::deployer::{DeployError, Deployer};
use crate::release::proposal::{ProposalBuilder, ProposalTx};
use crate::release::table::{AddressTable, TableError};

// Function names the proposal drives on proxies and the registry.
const SET_IMPLEMENTATION: &str = "setImplementation";
const SET_AND_INITIALIZE_IMPLEMENTATION: &str = "setAndInitializeImplementation";
const SET_ADDRESS_FOR: &str = "setAddressFor";

/// Errors that abort a release run.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The build's link references loop back on themselves.
    #[error("dependency cycle detected at '{0}'")]
    CyclicDependency(UnitName),

    /// The run would replace the proxy that owns every other proxy.
    #[error(
        "refusing to replace the Governance proxy: governance owns every proxy, \
         and replacing it would bypass the proposal process it exists to enforce"
    )]
    GovernanceProxyForbidden,

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Deploy(#[from] DeployError),
}

/// Where a unit stands in the current walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseState {
    /// Not reached yet.
    Unvisited,
    /// Currently on the walk's stack. Seen again, this is a cycle.
    InProgress,
    /// Fully released; repeat visits are no-ops.
    Released,
}

/// A non-fatal condition the operator should see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseWarning {
    /// A changed core contract kept its proxy; only the implementation
    /// moves, so existing contract state carries over.
    ImplementationOnlyUpgrade {
        unit: UnitName,
        implementation: Address,
    },
}

impl std::fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseWarning::ImplementationOnlyUpgrade {
                unit,
                implementation,
            } => write!(
                f,
                "{unit} changed without storage or interface impact; its proxy keeps \
                 existing state and only the implementation moves to {implementation}"
            ),
        }
    }
}

/// What a completed run hands back to the caller.
#[derive(Debug)]
pub struct ReleaseOutcome {
    /// The assembled proposal, ready to preview and persist.
    pub proposal: ProposalBuilder,
    /// Non-fatal warnings in the order they arose.
    pub warnings: Vec<ReleaseWarning>,
    /// Units in completion order.
    pub released: Vec<UnitName>,
}

/// Drives one release run over a fixed set of inputs.
pub struct Orchestrator<'a> {
    units: &'a UnitSet,
    graph: &'a DependencyGraph,
    report: &'a ChangeReport,
    init_args: &'a InitArgs,
    table: &'a mut AddressTable,
    deployer: Deployer<'a>,
    proposal: ProposalBuilder,
    states: BTreeMap<UnitName, ReleaseState>,
    warnings: Vec<ReleaseWarning>,
    order: Vec<UnitName>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        units: &'a UnitSet,
        graph: &'a DependencyGraph,
        report: &'a ChangeReport,
        init_args: &'a InitArgs,
        table: &'a mut AddressTable,
        deployer: Deployer<'a>,
    ) -> Self {
        Self {
            units,
            graph,
            report,
            init_args,
            table,
            deployer,
            proposal: ProposalBuilder::new(),
            states: BTreeMap::new(),
            warnings: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Where `name` stands in this run.
    pub fn state_of(&self, name: &UnitName) -> ReleaseState {
        self.states
            .get(name)
            .copied()
            .unwrap_or(ReleaseState::Unvisited)
    }

    /// Warnings collected so far.
    pub fn warnings(&self) -> &[ReleaseWarning] {
        &self.warnings
    }

    /// Units released so far, in completion order.
    pub fn release_order(&self) -> &[UnitName] {
        &self.order
    }

    /// The proposal as assembled so far.
    pub fn proposal(&self) -> &ProposalBuilder {
        &self.proposal
    }

    /// Release every traversal root, in order.
    pub async fn release_all(&mut self, roots: &[UnitName]) -> Result<(), ReleaseError> {
        for root in roots {
            self.release(root).await?;
        }
        Ok(())
    }

    /// Release one unit: dependencies first, then the unit itself.
    ///
    /// Idempotent within a run. Boxed because the recursion depth follows
    /// the dependency graph, which the type system cannot see through.
    pub fn release<'s>(&'s mut self, name: &'s UnitName) -> BoxFuture<'s, Result<(), ReleaseError>> {
        async move {
            match self.state_of(name) {
                ReleaseState::Released => return Ok(()),
                ReleaseState::InProgress => {
                    return Err(ReleaseError::CyclicDependency(name.clone()));
                }
                ReleaseState::Unvisited => {}
            }
            self.states.insert(name.clone(), ReleaseState::InProgress);

            let graph = self.graph;
            for dependency in graph.dependencies_of(name) {
                self.release(dependency).await?;
            }

            self.release_unit(name).await?;

            self.states.insert(name.clone(), ReleaseState::Released);
            self.order.push(name.clone());
            Ok(())
        }
        .boxed()
    }

    /// The walk has already released every dependency; now link,
    /// classify, and act on one unit.
    async fn release_unit(&mut self, name: &UnitName) -> Result<(), ReleaseError> {
        let units = self.units;
        let unit = units.require(name)?;
        let linked = self.link(unit)?;

        let report = self.report;
        let change = match report.get(name) {
            Some(change) => change,
            // Untouched units keep their seeded address.
            None => return Ok(()),
        };

        match change.kind() {
            UnitKind::Library => {
                // Libraries have no proxy: dependents link the new address
                // into their bytecode when they release after us.
                let address = self.deployer.deploy_implementation(name, &linked).await?;
                self.table.set(name.clone(), address);
                Ok(())
            }
            UnitKind::CoreContract => {
                let replace_proxy = change.has_storage_changes() || change.is_new_unit();
                self.release_core_contract(name, unit, &linked, replace_proxy)
                    .await
            }
        }
    }

    /// Substitute each dependency's current table address into the unit's
    /// bytecode. A dependency without a table entry is fatal here: it was
    /// neither registered on chain nor released by this walk.
    fn link(&self, unit: &Unit) -> Result<String, ReleaseError> {
        let mut addresses = BTreeMap::new();
        for dependency in self.graph.dependencies_of(&unit.name) {
            addresses.insert(dependency.clone(), self.table.get(dependency)?);
        }
        Ok(unit.artifact.link(&addresses)?)
    }

    async fn release_core_contract(
        &mut self,
        name: &UnitName,
        unit: &Unit,
        linked: &str,
        replace_proxy: bool,
    ) -> Result<(), ReleaseError> {
        if replace_proxy && *name == UnitCatalog::governance() {
            return Err(ReleaseError::GovernanceProxyForbidden);
        }

        let implementation = self.deployer.deploy_implementation(name, linked).await?;

        if !replace_proxy {
            self.proposal.append(
                ProposalTx::new(
                    name.proxy(),
                    SET_IMPLEMENTATION,
                    vec![Value::String(implementation.to_hex())],
                )
                .with_description(format!(
                    "point {} at the new {name} implementation",
                    name.proxy()
                )),
            );
            self.warnings.push(ReleaseWarning::ImplementationOnlyUpgrade {
                unit: name.clone(),
                implementation,
            });
            return Ok(());
        }

        let proxy = self.deployer.deploy_proxy(name).await?;

        // The deploying key owns the proxy right now; governance must own
        // it before the proposal executes, so this is a direct call.
        let governance = self.table.get(&UnitCatalog::governance())?;
        self.deployer
            .transfer_proxy_ownership(proxy, governance)
            .await?;
        self.table.set(name.clone(), proxy);

        // Repoint the registry before installing: anything resolving the
        // name mid-proposal must already land on the new proxy.
        self.proposal.append(
            ProposalTx::new(
                UnitCatalog::registry(),
                SET_ADDRESS_FOR,
                vec![
                    Value::String(name.as_str().to_string()),
                    Value::String(proxy.to_hex()),
                ],
            )
            .with_description(format!("register {name} at its new proxy")),
        );

        let install = match unit.artifact.initializer() {
            Some(function) => {
                let args = self.init_args.get(name);
                let data = abi::encode_initializer_call(name, function, args)?;
                // One transaction: the proxy must never expose an
                // installed-but-uninitialized implementation.
                ProposalTx::new(
                    name.proxy(),
                    SET_AND_INITIALIZE_IMPLEMENTATION,
                    vec![
                        Value::String(implementation.to_hex()),
                        Value::String(format!("0x{}", hex::encode(&data))),
                    ],
                )
                .with_description(format!(
                    "install and initialize the new {name} implementation"
                ))
            }
            None => ProposalTx::new(
                name.proxy(),
                SET_IMPLEMENTATION,
                vec![Value::String(implementation.to_hex())],
            )
            .with_description(format!("install the new {name} implementation")),
        };
        self.proposal.append(install);

        Ok(())
    }

    /// Consume the run and hand back its outputs.
    pub fn finish(self) -> ReleaseOutcome {
        ReleaseOutcome {
            proposal: self.proposal,
            warnings: self.warnings,
            released: self.order,
        }
    }
}
