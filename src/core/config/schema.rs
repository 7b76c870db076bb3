//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$STAGEHAND_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/stagehand/config.toml`
//! 3. `~/.stagehand/config.toml`
//!
//! # Project Config
//!
//! Located at `stagehand.toml` in the project directory, or wherever
//! `--config` points. Carries the unit catalog.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., `from` must be a valid address).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{Address, UnitKind, UnitName};

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// rpc_url = "http://127.0.0.1:8545"
/// from = "0x5409ed021d9299bf6814279a6a1411a7e866a631"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// JSON-RPC endpoint
    pub rpc_url: Option<String>,

    /// Default sender account
    pub from: Option<String>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_rpc_url(self.rpc_url.as_deref())?;
        validate_address("from", self.from.as_deref())?;
        Ok(())
    }
}

/// Project configuration.
///
/// # Example
///
/// ```toml
/// rpc_url = "https://forno.celo.org"
/// registry = "0x000000000000000000000000000000000000ce10"
/// build_dir = "build/contracts"
///
/// [[units]]
/// name = "Exchange"
///
/// [[units]]
/// name = "LinkedList"
/// kind = "library"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// JSON-RPC endpoint (overrides global)
    pub rpc_url: Option<String>,

    /// Sender account (overrides global)
    pub from: Option<String>,

    /// Address of the on-chain registry contract
    pub registry: Option<String>,

    /// Default build directory holding compiled artifacts
    pub build_dir: Option<String>,

    /// The unit catalog
    pub units: Vec<UnitEntry>,
}

impl ProjectConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_rpc_url(self.rpc_url.as_deref())?;
        validate_address("from", self.from.as_deref())?;
        validate_address("registry", self.registry.as_deref())?;

        let mut seen = std::collections::HashSet::new();
        for unit in &self.units {
            unit.validate()?;
            if !seen.insert(unit.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "duplicate unit '{}' in [[units]]",
                    unit.name
                )));
            }
        }

        Ok(())
    }
}

/// One catalog entry in project configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UnitEntry {
    /// Unit name as it appears in artifacts and the registry
    pub name: String,

    /// Unit kind (default: core-contract)
    #[serde(default = "default_unit_kind")]
    pub kind: UnitKind,

    /// Whether the unit sits behind a proxy. Core contracts default to
    /// proxied; libraries are never proxied.
    #[serde(default)]
    pub proxied: Option<bool>,
}

fn default_unit_kind() -> UnitKind {
    UnitKind::CoreContract
}

impl UnitEntry {
    /// Resolve the proxied flag with per-kind defaults applied.
    pub fn is_proxied(&self) -> bool {
        match self.kind {
            UnitKind::Library => false,
            UnitKind::CoreContract => self.proxied.unwrap_or(true),
        }
    }

    /// Validate a single entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        UnitName::new(&self.name).map_err(|e| {
            ConfigError::InvalidValue(format!("invalid unit name in [[units]]: {e}"))
        })?;

        if self.kind == UnitKind::Library && self.proxied == Some(true) {
            return Err(ConfigError::InvalidValue(format!(
                "unit '{}' is a library and cannot be proxied",
                self.name
            )));
        }

        Ok(())
    }
}

fn validate_rpc_url(url: Option<&str>) -> Result<(), ConfigError> {
    if let Some(url) = url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(format!(
                "rpc_url must be an http(s) endpoint, got '{url}'"
            )));
        }
    }
    Ok(())
}

fn validate_address(field: &str, value: Option<&str>) -> Result<(), ConfigError> {
    if let Some(value) = value {
        Address::from_hex(value)
            .map_err(|e| ConfigError::InvalidValue(format!("invalid {field}: {e}")))?;
    }
    Ok(())
}
