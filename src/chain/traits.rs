//! chain::traits
//!
//! Backend trait for the chain a release run deploys to.
//!
//! # Design
//!
//! The `ChainBackend` trait is async because every operation involves
//! network I/O. It is deliberately small: the release pipeline needs to
//! deploy creation bytecode, send one raw state-changing call (proxy
//! ownership transfer), and resolve names through the on-chain registry.
//! Everything else (nonce handling, address derivation, transport) is
//! the backend's business.
//!
//! Receipts are never awaited. Deployment addresses are derived from the
//! sender and nonce, so a backend can answer before the chain mines
//! anything.
//!
//! # Example
//!
//! ```ignore
//! use stagehand::chain::{ChainBackend, DeployRequest};
//!
//! async fn deploy(chain: &dyn ChainBackend) -> Result<(), stagehand::chain::ChainError> {
//!     let address = chain
//!         .deploy_contract(DeployRequest {
//!             bytecode: "0x6060".to_string(),
//!             description: "Exchange implementation".to_string(),
//!         })
//!         .await?;
//!     println!("deployed at {address}");
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{Address, UnitName};

/// Errors from chain backend operations.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// The node returned a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message from the node
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// The node answered, but not with anything usable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Request to deploy a contract.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    /// Fully linked creation bytecode as a `0x`-prefixed hex string.
    pub bytecode: String,
    /// Operator-facing label, e.g. `Exchange implementation`.
    pub description: String,
}

/// Interface to the chain a release run deploys against.
///
/// Implementations: [`crate::chain::JsonRpcChain`] for real nodes,
/// [`crate::chain::mock::MockChain`] for tests.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Name of this backend (for logs and error messages).
    fn name(&self) -> &'static str;

    /// Deploy a contract and return the address it will live at.
    async fn deploy_contract(&self, request: DeployRequest) -> Result<Address, ChainError>;

    /// Send a state-changing call to a deployed contract.
    ///
    /// `data` is full calldata (selector plus encoded arguments);
    /// `description` labels the call for logs.
    async fn send(&self, to: Address, data: Vec<u8>, description: &str)
        -> Result<(), ChainError>;

    /// Resolve a unit name through the on-chain registry.
    ///
    /// Returns the zero address for names the registry has never seen;
    /// callers treat that as "not registered", not as an error.
    async fn registry_address_for(&self, name: &UnitName) -> Result<Address, ChainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats() {
        let err = ChainError::Rpc {
            code: -32000,
            message: "insufficient funds".to_string(),
        };
        assert_eq!(err.to_string(), "RPC error -32000: insufficient funds");

        let err = ChainError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "network error: connection refused");

        let err = ChainError::InvalidResponse("empty result".to_string());
        assert_eq!(err.to_string(), "invalid response: empty result");
    }

    #[test]
    fn errors_are_cloneable() {
        let err = ChainError::Network("timeout".to_string());
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
