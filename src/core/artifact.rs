//! core::artifact
//!
//! Compiled artifact loading and library linking.
//!
//! # Artifacts
//!
//! A build directory holds one JSON artifact per compiled contract with
//! (at least) `contractName`, `abi`, and `bytecode` fields. Bytecode is
//! stored as a hex string template: where a contract depends on a linked
//! library, the compiler leaves a 40-character placeholder in place of
//! the library address:
//!
//! ```text
//! __LinkedList____________________________
//! ```
//!
//! that is, `__` followed by the library name, padded to 40 characters
//! with `_`. Linking substitutes each placeholder with the 40 hex
//! characters of the library's current address.
//!
//! # Unit sets
//!
//! [`UnitSet::load_dir`] keeps only artifacts that belong to the catalog:
//! the units themselves plus their `<name>Proxy` companions. Everything
//! else in the build directory (mocks, interfaces, test helpers) is
//! ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ethers_core::abi::{Abi, Function};
use serde::Deserialize;
use thiserror::Error;

use crate::core::catalog::UnitCatalog;
use crate::core::types::{Address, UnitKind, UnitName};

/// Width of a legacy link placeholder, equal to the width of a hex
/// encoded address.
const LINK_WIDTH: usize = 40;

/// Errors from artifact loading and linking.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read build directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read artifact {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("bytecode for '{contract}' still references '{reference}' after linking")]
    UnlinkedReference { contract: String, reference: String },

    #[error("linked bytecode for '{contract}' is not valid hex: {message}")]
    InvalidBytecode { contract: String, message: String },

    #[error("no artifact loaded for '{0}'")]
    Missing(UnitName),
}

// Wire format of a compiled artifact. Extra fields (AST, source maps,
// deployed bytecode) are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: String,
    abi: Abi,
    #[serde(default)]
    bytecode: String,
}

/// A compiled contract artifact.
///
/// The optional `initialize` function descriptor is extracted once at
/// parse time; it drives whether a new proxy gets
/// `setAndInitializeImplementation` or plain `setImplementation`.
#[derive(Debug, Clone)]
pub struct Artifact {
    contract_name: String,
    abi: Abi,
    bytecode: String,
    initializer: Option<Function>,
}

impl Artifact {
    /// Parse an artifact from its JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let raw: RawArtifact = serde_json::from_str(json)?;
        let initializer = raw.abi.function("initialize").ok().cloned();
        Ok(Self {
            contract_name: raw.contract_name,
            abi: raw.abi,
            bytecode: raw.bytecode,
            initializer,
        })
    }

    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    /// The `initialize` function, if the contract declares one.
    pub fn initializer(&self) -> Option<&Function> {
        self.initializer.as_ref()
    }

    /// The raw bytecode template, placeholders and all.
    pub fn bytecode_template(&self) -> &str {
        &self.bytecode
    }

    /// Whether the artifact carries creation bytecode at all. Interfaces
    /// and abstract contracts do not.
    pub fn is_deployable(&self) -> bool {
        !self.template_body().is_empty()
    }

    fn template_body(&self) -> &str {
        self.bytecode.strip_prefix("0x").unwrap_or(&self.bytecode)
    }

    /// Library names this bytecode links against, in first-appearance
    /// order, deduplicated.
    pub fn link_references(&self) -> Vec<UnitName> {
        let mut refs: Vec<UnitName> = Vec::new();
        for (_, raw) in scan_placeholders(self.template_body()) {
            // A placeholder that is not a valid unit name cannot be
            // resolved; link() reports it as an unlinked reference.
            if let Ok(name) = UnitName::new(raw) {
                if !refs.contains(&name) {
                    refs.push(name);
                }
            }
        }
        refs
    }

    /// Substitute every link placeholder with the matching address and
    /// return the deployable `0x`-prefixed hex string.
    ///
    /// # Errors
    ///
    /// Fails if a placeholder has no entry in `addresses`, or if the
    /// substituted output is not clean hex.
    pub fn link(&self, addresses: &BTreeMap<UnitName, Address>) -> Result<String, ArtifactError> {
        let body = self.template_body();
        let mut out = String::with_capacity(body.len());
        let mut cursor = 0;

        for (pos, raw) in scan_placeholders(body) {
            out.push_str(&body[cursor..pos]);
            let resolved = UnitName::new(raw)
                .ok()
                .and_then(|name| addresses.get(&name).copied());
            match resolved {
                Some(address) => out.push_str(&hex::encode(address.as_bytes())),
                None => {
                    return Err(ArtifactError::UnlinkedReference {
                        contract: self.contract_name.clone(),
                        reference: raw.to_string(),
                    })
                }
            }
            cursor = pos + LINK_WIDTH;
        }
        out.push_str(&body[cursor..]);

        if let Some(bad) = out.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ArtifactError::InvalidBytecode {
                contract: self.contract_name.clone(),
                message: format!("unexpected character '{bad}'"),
            });
        }
        if out.len() % 2 != 0 {
            return Err(ArtifactError::InvalidBytecode {
                contract: self.contract_name.clone(),
                message: format!("odd hex length {}", out.len()),
            });
        }

        Ok(format!("0x{out}"))
    }
}

/// Find legacy link placeholders in a bytecode body.
///
/// Returns `(byte offset, referenced name)` pairs in order. Trailing
/// underscores in a name are indistinguishable from padding; upstream
/// contract names never end in one.
fn scan_placeholders(body: &str) -> Vec<(usize, &str)> {
    let bytes = body.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i + LINK_WIDTH <= bytes.len() {
        if bytes[i] == b'_' && bytes[i + 1] == b'_' {
            let name = body[i + 2..i + LINK_WIDTH].trim_end_matches('_');
            if !name.is_empty() {
                found.push((i, name));
                i += LINK_WIDTH;
                continue;
            }
        }
        i += 1;
    }

    found
}

/// A release unit joined with its compiled artifact.
#[derive(Debug, Clone)]
pub struct Unit {
    pub name: UnitName,
    pub kind: UnitKind,
    pub artifact: Artifact,
}

/// Every artifact a release run can see, keyed by unit name.
///
/// Proxy companion artifacts are held separately, keyed by the base
/// unit's name.
#[derive(Debug, Clone, Default)]
pub struct UnitSet {
    units: BTreeMap<UnitName, Unit>,
    proxies: BTreeMap<UnitName, Artifact>,
}

impl UnitSet {
    /// Load all catalog-relevant artifacts from a build directory.
    ///
    /// Files are visited in sorted order. Non-JSON files and artifacts
    /// for contracts outside the catalog are skipped.
    pub fn load_dir(dir: &Path, catalog: &UnitCatalog) -> Result<Self, ArtifactError> {
        let read_dir = std::fs::read_dir(dir).map_err(|source| ArtifactError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| ArtifactError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;
            paths.push(entry.path());
        }
        paths.sort();

        let mut set = Self::default();
        for path in paths {
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let text =
                std::fs::read_to_string(&path).map_err(|source| ArtifactError::ReadError {
                    path: path.clone(),
                    source,
                })?;
            let artifact =
                Artifact::from_json_str(&text).map_err(|source| ArtifactError::ParseError {
                    path: path.clone(),
                    source,
                })?;
            set.insert_artifact(artifact, catalog);
        }

        Ok(set)
    }

    fn insert_artifact(&mut self, artifact: Artifact, catalog: &UnitCatalog) {
        let name = match UnitName::new(artifact.contract_name()) {
            Ok(name) => name,
            // Build directories hold plenty of contracts that are not
            // release units; names we cannot represent are never ours.
            Err(_) => return,
        };

        if let Some(entry) = catalog.get(&name) {
            self.units.insert(
                name.clone(),
                Unit {
                    name,
                    kind: entry.kind,
                    artifact,
                },
            );
        } else if let Some(base) = name.proxy_base() {
            if catalog.contains(&base) {
                self.proxies.insert(base, artifact);
            }
        }
    }

    /// Add a unit directly. Used by in-memory setups.
    pub fn insert_unit(&mut self, unit: Unit) {
        self.units.insert(unit.name.clone(), unit);
    }

    /// Add a proxy companion artifact for a base unit.
    pub fn insert_proxy(&mut self, base: UnitName, artifact: Artifact) {
        self.proxies.insert(base, artifact);
    }

    pub fn get(&self, name: &UnitName) -> Option<&Unit> {
        self.units.get(name)
    }

    /// Like [`UnitSet::get`], but a missing unit is an error.
    pub fn require(&self, name: &UnitName) -> Result<&Unit, ArtifactError> {
        self.units
            .get(name)
            .ok_or_else(|| ArtifactError::Missing(name.clone()))
    }

    pub fn proxy_artifact(&self, base: &UnitName) -> Option<&Artifact> {
        self.proxies.get(base)
    }

    /// The proxy companion artifact for `base`, or an error naming the
    /// missing `<base>Proxy` artifact.
    pub fn require_proxy(&self, base: &UnitName) -> Result<&Artifact, ArtifactError> {
        self.proxies
            .get(base)
            .ok_or_else(|| ArtifactError::Missing(base.proxy()))
    }

    /// Loaded unit names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &UnitName> {
        self.units.keys()
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
