//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Stagehand has two configuration scopes:
//! - **Global**: user-level defaults (RPC endpoint, sender)
//! - **Project**: per-project settings and the unit catalog
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$STAGEHAND_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/stagehand/config.toml`
//! 3. `~/.stagehand/config.toml`
//!
//! # Project Config Location
//!
//! `stagehand.toml` in the project directory, or an explicit `--config`
//! path. An explicit path that does not exist is an error; the implicit
//! one is optional.
//!
//! # Example
//!
//! ```no_run
//! use stagehand::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(None, Path::new(".")).unwrap();
//! let config = result.config;
//!
//! println!("RPC endpoint: {}", config.rpc_url());
//! println!("Catalog size: {}", config.catalog().unwrap().len());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, ProjectConfig, UnitEntry};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::catalog::{CatalogEntry, UnitCatalog};
use crate::core::types::{Address, UnitName};

/// File name of the implicit project config.
pub const PROJECT_FILE: &str = "stagehand.toml";

/// RPC endpoint used when nothing is configured.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Registry address used when nothing is configured.
pub const DEFAULT_REGISTRY: &str = "0x000000000000000000000000000000000000ce10";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// This struct provides accessor methods that apply precedence rules
/// automatically. Project config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Project configuration (if present)
    pub project: Option<ProjectConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// `project_file` is an explicit config path (from `--config`);
    /// when absent, `stagehand.toml` in `project_dir` is used if it
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed, or
    /// if an explicit `project_file` is missing. An absent implicit
    /// project config is not an error (defaults are used).
    pub fn load(
        project_file: Option<&Path>,
        project_dir: &Path,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = Self::load_global()?;

        let (project, project_path) = match project_file {
            // Explicit path: must load
            Some(path) => {
                let config = Self::read_project_config(path)?;
                (Some(config), Some(path.to_path_buf()))
            }
            None => {
                let implicit = project_dir.join(PROJECT_FILE);
                if implicit.exists() {
                    let config = Self::read_project_config(&implicit)?;
                    (Some(config), Some(implicit))
                } else {
                    (None, None)
                }
            }
        };

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
            if p.units.is_empty() {
                if let Some(path) = &project_path {
                    warnings.push(ConfigWarning {
                        message: "project config declares no [[units]]; nothing can be released"
                            .to_string(),
                        path: path.clone(),
                    });
                }
            }
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                global_path,
                project_path,
            },
            warnings,
        })
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $STAGEHAND_CONFIG
        if let Ok(path) = std::env::var("STAGEHAND_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_global_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. Check $XDG_CONFIG_HOME/stagehand/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("stagehand/config.toml");
            if path.exists() {
                let config = Self::read_global_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.stagehand/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".stagehand/config.toml");
            if path.exists() {
                let config = Self::read_global_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // No config found, use defaults
        Ok((GlobalConfig::default(), None))
    }

    /// Read and parse a global config file.
    fn read_global_config(path: &Path) -> Result<GlobalConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read and parse a project config file.
    fn read_project_config(path: &Path) -> Result<ProjectConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// The JSON-RPC endpoint.
    pub fn rpc_url(&self) -> &str {
        self.project
            .as_ref()
            .and_then(|p| p.rpc_url.as_deref())
            .or(self.global.rpc_url.as_deref())
            .unwrap_or(DEFAULT_RPC_URL)
    }

    /// The configured sender account, if any.
    pub fn from_address(&self) -> Result<Option<Address>, ConfigError> {
        let raw = self
            .project
            .as_ref()
            .and_then(|p| p.from.as_deref())
            .or(self.global.from.as_deref());
        match raw {
            Some(raw) => Address::from_hex(raw)
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue(format!("invalid from: {e}"))),
            None => Ok(None),
        }
    }

    /// The on-chain registry contract address.
    pub fn registry(&self) -> Result<Address, ConfigError> {
        let raw = self
            .project
            .as_ref()
            .and_then(|p| p.registry.as_deref())
            .unwrap_or(DEFAULT_REGISTRY);
        Address::from_hex(raw)
            .map_err(|e| ConfigError::InvalidValue(format!("invalid registry: {e}")))
    }

    /// The configured build directory, if any.
    pub fn build_dir(&self) -> Option<&Path> {
        self.project
            .as_ref()
            .and_then(|p| p.build_dir.as_deref())
            .map(Path::new)
    }

    /// The unit catalog declared in project config.
    ///
    /// An absent project config yields an empty catalog.
    pub fn catalog(&self) -> Result<UnitCatalog, ConfigError> {
        let Some(project) = &self.project else {
            return Ok(UnitCatalog::default());
        };

        let mut entries = Vec::with_capacity(project.units.len());
        for unit in &project.units {
            let name = UnitName::new(&unit.name).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid unit name in [[units]]: {e}"))
            })?;
            entries.push(CatalogEntry {
                name,
                kind: unit.kind,
                proxied: unit.is_proxied(),
            });
        }
        Ok(UnitCatalog::new(entries))
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const UNITS_TOML: &str = r#"
        registry = "0x000000000000000000000000000000000000ce10"
        build_dir = "build/contracts"

        [[units]]
        name = "Exchange"

        [[units]]
        name = "LinkedList"
        kind = "library"
    "#;

    #[test]
    fn defaults_without_files() {
        let config = Config::default();

        assert_eq!(config.rpc_url(), DEFAULT_RPC_URL);
        assert_eq!(config.registry().unwrap().to_hex(), DEFAULT_REGISTRY);
        assert!(config.from_address().unwrap().is_none());
        assert!(config.build_dir().is_none());
        assert!(config.catalog().unwrap().is_empty());
    }

    #[test]
    fn load_global_from_env() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");

        fs::write(
            &config_path,
            r#"
            rpc_url = "https://forno.celo.org"
            "#,
        )
        .unwrap();

        // Set env var
        std::env::set_var("STAGEHAND_CONFIG", config_path.to_str().unwrap());

        let result = Config::load(None, temp.path()).unwrap();
        let config = result.config;

        assert_eq!(config.rpc_url(), "https://forno.celo.org");
        assert_eq!(config.global_config_loaded_from(), Some(config_path.as_path()));

        // Clean up
        std::env::remove_var("STAGEHAND_CONFIG");
    }

    #[test]
    fn load_explicit_project_config() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("release.toml");
        fs::write(&config_path, UNITS_TOML).unwrap();

        let result = Config::load(Some(&config_path), temp.path()).unwrap();
        let config = result.config;

        assert!(result.warnings.is_empty());
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(config.build_dir(), Some(Path::new("build/contracts")));
        assert_eq!(
            config.registry().unwrap().to_hex(),
            "0x000000000000000000000000000000000000ce10"
        );
    }

    #[test]
    fn load_implicit_project_config() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PROJECT_FILE), UNITS_TOML).unwrap();

        let result = Config::load(None, temp.path()).unwrap();
        assert_eq!(result.config.catalog().unwrap().len(), 2);
    }

    #[test]
    fn missing_explicit_config_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");

        let result = Config::load(Some(&missing), temp.path());
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn missing_implicit_config_is_fine() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(None, temp.path()).unwrap();
        assert!(result.config.project.is_none());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(PROJECT_FILE);
        fs::write(&config_path, "unknown_field = true").unwrap();

        let result = Config::load(None, temp.path());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_unit_rejected_at_load() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_FILE),
            r#"
            [[units]]
            name = "Exchange"
            kind = "library"
            proxied = true
            "#,
        )
        .unwrap();

        let result = Config::load(None, temp.path());
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn empty_units_warns() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_FILE),
            r#"rpc_url = "http://127.0.0.1:8545""#,
        )
        .unwrap();

        let result = Config::load(None, temp.path()).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("no [[units]]"));
    }

    #[test]
    fn precedence_project_overrides_global() {
        let config = Config {
            global: GlobalConfig {
                rpc_url: Some("http://global:8545".to_string()),
                from: Some("0x5409ed021d9299bf6814279a6a1411a7e866a631".to_string()),
            },
            project: Some(ProjectConfig {
                rpc_url: Some("http://project:8545".to_string()),
                ..Default::default()
            }),
            global_path: None,
            project_path: None,
        };

        // Project endpoint wins; from falls through to global
        assert_eq!(config.rpc_url(), "http://project:8545");
        assert_eq!(
            config.from_address().unwrap().unwrap().to_hex(),
            "0x5409ed021d9299bf6814279a6a1411a7e866a631"
        );
    }
}
