//! release::deployer
//!
//! Contract deployment and proxy ownership transfer.
//!
//! # Architecture
//!
//! The deployer is the walk's only path to the chain. It deploys linked
//! implementations, deploys proxy companions, and hands fresh proxies to
//! Governance with a direct `transferOwnership` call. In dry-run mode
//! nothing touches the backend: deployments return deterministic
//! stand-in addresses so the resulting proposal is complete, reviewable,
//! and reproducible.
//!
//! # Invariants
//!
//! - Stand-in addresses are distinct within a run and identical across
//!   reruns of the same sequence
//! - A missing proxy companion artifact is fatal before anything is sent

use std::collections::BTreeMap;

use ethers_core::abi::Token;
use ethers_core::types::H160;
use ethers_core::utils::{id, keccak256};
use thiserror::Error;

use crate::chain::{ChainBackend, ChainError, DeployRequest};
use crate::core::artifact::{ArtifactError, UnitSet};
use crate::core::types::{Address, UnitName};

/// Selector source for the direct ownership handoff.
const TRANSFER_OWNERSHIP_SIGNATURE: &str = "transferOwnership(address)";

/// Domain tag mixed into dry-run stand-in addresses.
const STANDIN_TAG: &[u8] = b"stagehand-dry-run";

/// Errors from deployment operations.
#[derive(Debug, Error)]
pub enum DeployError {
    /// No artifact is available for the thing being deployed.
    #[error("no artifact available to deploy '{0}'")]
    MissingArtifact(UnitName),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Deploys units and wires fresh proxies to their owner.
pub struct Deployer<'a> {
    chain: &'a dyn ChainBackend,
    units: &'a UnitSet,
    dry_run: bool,
    /// Stand-in counter; advances only in dry-run mode.
    standins: u64,
}

impl<'a> Deployer<'a> {
    pub fn new(chain: &'a dyn ChainBackend, units: &'a UnitSet) -> Self {
        Self {
            chain,
            units,
            dry_run: false,
            standins: 0,
        }
    }

    /// Toggle dry-run mode (builder pattern).
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Deploy an already-linked implementation and return its address.
    pub async fn deploy_implementation(
        &mut self,
        unit: &UnitName,
        linked_bytecode: &str,
    ) -> Result<Address, DeployError> {
        self.deploy(unit.clone(), linked_bytecode.to_string()).await
    }

    /// Deploy the `<base>Proxy` companion and return its address.
    ///
    /// # Errors
    ///
    /// Fails with [`DeployError::MissingArtifact`] if the build directory
    /// had no proxy artifact for the unit.
    pub async fn deploy_proxy(&mut self, base: &UnitName) -> Result<Address, DeployError> {
        let artifact = self
            .units
            .proxy_artifact(base)
            .ok_or_else(|| DeployError::MissingArtifact(base.proxy()))?;

        // Proxies link against nothing; a placeholder here is a build defect.
        let bytecode = artifact.link(&BTreeMap::new())?;
        self.deploy(base.proxy(), bytecode).await
    }

    /// Hand a fresh proxy to its owner with a direct `transferOwnership`
    /// call. Not a proposal entry: the deploying key still owns the proxy
    /// at this point, and it must not by the time the proposal executes.
    pub async fn transfer_proxy_ownership(
        &mut self,
        proxy: Address,
        new_owner: Address,
    ) -> Result<(), DeployError> {
        if self.dry_run {
            return Ok(());
        }

        let mut data = id(TRANSFER_OWNERSHIP_SIGNATURE).to_vec();
        data.extend_from_slice(&ethers_core::abi::encode(&[Token::Address(
            new_owner.h160(),
        )]));

        self.chain
            .send(proxy, data, "transferOwnership")
            .await?;
        Ok(())
    }

    async fn deploy(&mut self, name: UnitName, bytecode: String) -> Result<Address, DeployError> {
        if self.dry_run {
            return Ok(self.standin(&name));
        }

        let address = self
            .chain
            .deploy_contract(DeployRequest {
                bytecode,
                description: format!("deploy {name}"),
            })
            .await?;
        Ok(address)
    }

    /// Deterministic stand-in address for a dry-run deployment.
    ///
    /// Derived from a fixed tag, the unit name, and a per-run counter, so
    /// reruns of the same walk produce the same proposal byte for byte.
    fn standin(&mut self, name: &UnitName) -> Address {
        self.standins += 1;

        let mut preimage = Vec::with_capacity(STANDIN_TAG.len() + name.as_str().len() + 8);
        preimage.extend_from_slice(STANDIN_TAG);
        preimage.extend_from_slice(name.as_str().as_bytes());
        preimage.extend_from_slice(&self.standins.to_be_bytes());

        let digest = keccak256(&preimage);
        Address::from(H160::from_slice(&digest[12..]))
    }
}
