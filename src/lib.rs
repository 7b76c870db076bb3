//! Stagehand - dependency-aware contract release orchestration
//!
//! Stagehand takes a backward-compatibility report, a directory of
//! compiled contract artifacts, and the current on-chain registry state,
//! and stages a release: it deploys changed implementations in dependency
//! order, links libraries, decides per contract whether its proxy
//! survives or must be replaced, and emits an ordered transaction
//! proposal for the governance pipeline to execute.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to handlers)
//! - [`release`] - The release pipeline: address table, deployer, orchestrator, proposal
//! - [`core`] - Domain types, config, catalog, artifacts, report, dependency graph
//! - [`abi`] - Initializer-call encoding against artifact ABIs
//! - [`chain`] - Chain backend abstraction (JSON-RPC v1, mock for tests)
//! - [`ui`] - Terminal output utilities
//!
//! # Correctness Invariants
//!
//! Stagehand maintains the following invariants:
//!
//! 1. A unit's dependencies are fully released before the unit links
//! 2. The address table always holds the currently canonical address
//! 3. Proposal transactions are appended in execution order, never reordered
//! 4. The Governance proxy is never replaced by a release run

pub mod abi;
pub mod chain;
pub mod cli;
pub mod core;
pub mod release;
pub mod ui;
