//! chain
//!
//! Abstraction over the chain a release run deploys to.
//!
//! # Architecture
//!
//! The `ChainBackend` trait defines the three capabilities the release
//! pipeline needs: deploy creation bytecode, send a raw state-changing
//! call, and resolve names through the on-chain registry. The
//! orchestration layers hold a `&dyn ChainBackend` and never know which
//! implementation is behind it.
//!
//! Backend failures abort the run; nothing in this crate retries or
//! rolls back transactions that already left the process.
//!
//! # Modules
//!
//! - `traits`: Core `ChainBackend` trait and request/error types
//! - [`jsonrpc`]: JSON-RPC implementation for unlocked-account nodes
//! - [`mock`]: Mock implementation for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use stagehand::chain::{ChainBackend, DeployRequest, JsonRpcChain};
//!
//! let chain = JsonRpcChain::new(rpc_url, from, registry);
//! let address = chain.deploy_contract(DeployRequest {
//!     bytecode: linked,
//!     description: "Exchange implementation".to_string(),
//! }).await?;
//! ```

pub mod jsonrpc;
pub mod mock;
mod traits;

pub use jsonrpc::JsonRpcChain;
pub use traits::*;
