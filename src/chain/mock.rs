//! chain::mock
//!
//! Mock chain backend for deterministic testing.
//!
//! # Design
//!
//! The mock backend keeps all state in memory: a registry fixture map,
//! a deployment counter that mints distinct, reproducible addresses, and
//! a log of every operation in call order. Tests assert on the log to
//! verify sequencing (dependency deploys before dependents, ownership
//! transfer before the registry retarget, and so on).
//!
//! # Example
//!
//! ```
//! use stagehand::chain::mock::MockChain;
//! use stagehand::chain::{ChainBackend, DeployRequest};
//!
//! # tokio_test::block_on(async {
//! let chain = MockChain::new();
//!
//! let first = chain.deploy_contract(DeployRequest {
//!     bytecode: "0x6060".to_string(),
//!     description: "Exchange implementation".to_string(),
//! }).await.unwrap();
//!
//! let second = chain.deploy_contract(DeployRequest {
//!     bytecode: "0x6060".to_string(),
//!     description: "ExchangeProxy".to_string(),
//! }).await.unwrap();
//!
//! // Addresses are distinct and reproducible run to run
//! assert_ne!(first, second);
//! assert_eq!(first, MockChain::deployed_address(1));
//! # });
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers_core::types::H160;

use super::traits::{ChainBackend, ChainError, DeployRequest};
use crate::core::types::{Address, UnitName};

/// Mock chain for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockChain {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockChainInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockChainInner {
    /// Registry fixture: name → address answered by lookups.
    registry: BTreeMap<UnitName, Address>,
    /// Count of deployments so far; the next deploy is number count+1.
    deployments: u64,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail deploy_contract with the given error.
    DeployContract(ChainError),
    /// Fail send with the given error.
    Send(ChainError),
    /// Fail registry_address_for with the given error.
    RegistryLookup(ChainError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone)]
pub enum MockOperation {
    DeployContract {
        description: String,
        bytecode: String,
        address: Address,
    },
    Send {
        to: Address,
        data: Vec<u8>,
        description: String,
    },
    RegistryLookup {
        name: UnitName,
    },
}

impl MockChain {
    /// Create a new empty mock chain.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockChainInner {
                registry: BTreeMap::new(),
                deployments: 0,
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// The address the nth deployment (1-based) receives.
    ///
    /// Pure function of `n`, so tests can predict addresses without
    /// threading values around.
    pub fn deployed_address(n: u64) -> Address {
        Address::from(H160::from_low_u64_be(0x00d0_0000 + n))
    }

    /// Seed a registry fixture entry.
    ///
    /// # Example
    ///
    /// ```
    /// use stagehand::chain::mock::MockChain;
    /// use stagehand::core::types::{Address, UnitName};
    ///
    /// let chain = MockChain::new().with_registry_entry(
    ///     UnitName::new("Exchange").unwrap(),
    ///     Address::from_hex("0x00000000000000000000000000000000000000e1").unwrap(),
    /// );
    /// ```
    pub fn with_registry_entry(self, name: UnitName, address: Address) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.registry.insert(name, address);
        }
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use stagehand::chain::mock::{FailOn, MockChain};
    /// use stagehand::chain::ChainError;
    ///
    /// let chain = MockChain::new().fail_on(FailOn::DeployContract(
    ///     ChainError::Network("connection refused".to_string()),
    /// ));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Get all recorded operations.
    ///
    /// Useful for verifying call order.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Number of deployments performed so far.
    pub fn deployment_count(&self) -> u64 {
        let inner = self.inner.lock().unwrap();
        inner.deployments
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail<T>(&self, expected: &str) -> Option<Result<T, ChainError>> {
        let inner = self.inner.lock().unwrap();
        match &inner.fail_on {
            Some(FailOn::DeployContract(e)) if expected == "deploy_contract" => {
                Some(Err(e.clone()))
            }
            Some(FailOn::Send(e)) if expected == "send" => Some(Err(e.clone())),
            Some(FailOn::RegistryLookup(e)) if expected == "registry_lookup" => {
                Some(Err(e.clone()))
            }
            _ => None,
        }
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainBackend for MockChain {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn deploy_contract(&self, request: DeployRequest) -> Result<Address, ChainError> {
        if let Some(result) = self.check_fail("deploy_contract") {
            // Failed deployments record nothing; nothing reached the chain.
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.deployments += 1;
        let address = Self::deployed_address(inner.deployments);

        inner.operations.push(MockOperation::DeployContract {
            description: request.description,
            bytecode: request.bytecode,
            address,
        });

        Ok(address)
    }

    async fn send(
        &self,
        to: Address,
        data: Vec<u8>,
        description: &str,
    ) -> Result<(), ChainError> {
        if let Some(result) = self.check_fail::<()>("send") {
            return result;
        }

        self.record(MockOperation::Send {
            to,
            data,
            description: description.to_string(),
        });

        Ok(())
    }

    async fn registry_address_for(&self, name: &UnitName) -> Result<Address, ChainError> {
        self.record(MockOperation::RegistryLookup { name: name.clone() });

        if let Some(result) = self.check_fail("registry_lookup") {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        // Absent names answer the zero address, like the real registry.
        Ok(inner.registry.get(name).copied().unwrap_or_else(Address::zero))
    }
}
