//! release::table
//!
//! The address table: where every release unit currently lives.
//!
//! # Architecture
//!
//! A release run owns exactly one table. It is seeded once from the
//! on-chain registry (plus the trusted library mapping from the build
//! manifest) and then mutated only by the release walk as fresh
//! deployments land. Lookups never invent a value: a name without an
//! entry is an error, not a zero address.
//!
//! # Invariants
//!
//! - `get` never returns a default for an unknown name
//! - `set` overwrites unconditionally; the walk always writes the newest
//!   address last
//! - Seeding skips zero addresses (the registry's "never registered"
//!   answer) and applies the library mapping after the registry, so the
//!   mapping wins on conflict
//!
//! # Example
//!
//! ```
//! use stagehand::core::types::{Address, UnitName};
//! use stagehand::release::table::AddressTable;
//!
//! let mut table = AddressTable::new();
//! let exchange = UnitName::new("Exchange").unwrap();
//!
//! assert!(table.get(&exchange).is_err());
//!
//! let addr = Address::from_hex("0x5409ed021d9299bf6814279a6a1411a7e866a631").unwrap();
//! table.set(exchange.clone(), addr);
//! assert_eq!(table.get(&exchange).unwrap(), addr);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use futures::future;
use thiserror::Error;

use crate::chain::{ChainBackend, ChainError};
use crate::core::types::{Address, UnitName};

/// Errors from address table operations.
#[derive(Debug, Error)]
pub enum TableError {
    /// No address is known for a referenced unit.
    #[error("no known address for '{0}'")]
    AddressNotFound(UnitName),

    /// Failed to read a library mapping file.
    #[error("failed to read library mapping from {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a library mapping file.
    #[error("failed to parse library mapping: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Trusted library addresses from the build manifest.
///
/// The file format is one JSON object mapping unit names to addresses:
///
/// ```json
/// {
///   "LinkedList": "0x35cf4c91faa177af71207eb2e1cef21bbc23231d"
/// }
/// ```
///
/// Entries here override whatever the registry reports during seeding:
/// libraries are not registered on chain, so the manifest is the only
/// authority for where the last release put them.
#[derive(Debug, Clone, Default)]
pub struct LibraryMapping {
    entries: BTreeMap<UnitName, Address>,
}

impl LibraryMapping {
    /// Load a library mapping from a JSON file.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let text = std::fs::read_to_string(path).map_err(|source| TableError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parse a library mapping from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        let entries: BTreeMap<UnitName, Address> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    pub fn insert(&mut self, name: UnitName, address: Address) {
        self.entries.insert(name, address);
    }

    /// Mapping entries in sorted name order.
    pub fn entries(&self) -> impl Iterator<Item = (&UnitName, &Address)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Current addresses for release units, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct AddressTable {
    entries: BTreeMap<UnitName, Address>,
}

impl AddressTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current address of a unit.
    ///
    /// # Errors
    ///
    /// Returns `TableError::AddressNotFound` if the unit has no entry.
    /// There is deliberately no zero-address fallback: every caller that
    /// reaches for a missing address is about to bake it into bytecode
    /// or a governance transaction.
    pub fn get(&self, name: &UnitName) -> Result<Address, TableError> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| TableError::AddressNotFound(name.clone()))
    }

    /// Record the current address of a unit, replacing any prior entry.
    pub fn set(&mut self, name: UnitName, address: Address) {
        self.entries.insert(name, address);
    }

    pub fn contains(&self, name: &UnitName) -> bool {
        self.entries.contains_key(name)
    }

    /// Table entries in sorted name order.
    pub fn entries(&self) -> impl Iterator<Item = (&UnitName, &Address)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seed the table from the registry, then overlay the library mapping.
    ///
    /// One registry lookup per name, all in parallel; the lookups are
    /// read-only and independent so there is no fan-out bound. Names the
    /// registry answers with the zero address are skipped: "never
    /// registered" is an expected state, not an error. Library mapping
    /// entries are applied last and take precedence over registry answers.
    ///
    /// # Errors
    ///
    /// Fails on the first lookup the backend rejects.
    pub async fn seed<I>(
        &mut self,
        names: I,
        chain: &dyn ChainBackend,
        libraries: &LibraryMapping,
    ) -> Result<(), ChainError>
    where
        I: IntoIterator<Item = UnitName>,
    {
        let lookups = names.into_iter().map(|name| async move {
            let address = chain.registry_address_for(&name).await?;
            Ok::<(UnitName, Address), ChainError>((name, address))
        });

        for (name, address) in future::try_join_all(lookups).await? {
            if address.is_zero() {
                continue;
            }
            self.entries.insert(name, address);
        }

        for (name, address) in libraries.entries() {
            self.entries.insert(name.clone(), *address);
        }

        Ok(())
    }
}
