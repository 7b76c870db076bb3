//! core::catalog
//!
//! The closed set of release units stagehand manages.
//!
//! # Design
//!
//! A release run operates over a fixed catalog declared in project
//! configuration: every unit has a name, a kind, and (for core contracts)
//! a proxied flag. Two names are load-bearing: `Governance`, which owns
//! every proxy and executes passed proposals, and `Registry`, whose
//! on-chain instance maps unit names to canonical addresses.
//!
//! Iteration is in sorted name order, so seeding and root selection are
//! deterministic run to run.

use std::collections::BTreeMap;

use crate::core::types::{UnitKind, UnitName};

/// The unit that owns every proxy and executes passed proposals.
pub const GOVERNANCE_UNIT: &str = "Governance";

/// The unit whose on-chain instance maps names to canonical addresses.
pub const REGISTRY_UNIT: &str = "Registry";

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: UnitName,
    pub kind: UnitKind,
    /// Whether the unit sits behind a proxy. Meaningful for core
    /// contracts; libraries are never proxied.
    pub proxied: bool,
}

impl CatalogEntry {
    pub fn core_contract(name: UnitName, proxied: bool) -> Self {
        Self {
            name,
            kind: UnitKind::CoreContract,
            proxied,
        }
    }

    pub fn library(name: UnitName) -> Self {
        Self {
            name,
            kind: UnitKind::Library,
            proxied: false,
        }
    }
}

/// The catalog of units a release run may touch.
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    entries: BTreeMap<UnitName, CatalogEntry>,
}

impl UnitCatalog {
    /// Build a catalog from entries. Later duplicates replace earlier ones.
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();
        Self { entries }
    }

    /// The well-known governance unit name.
    pub fn governance() -> UnitName {
        UnitName::from_const(GOVERNANCE_UNIT)
    }

    /// The well-known registry unit name.
    pub fn registry() -> UnitName {
        UnitName::from_const(REGISTRY_UNIT)
    }

    pub fn get(&self, name: &UnitName) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &UnitName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn kind_of(&self, name: &UnitName) -> Option<UnitKind> {
        self.entries.get(name).map(|entry| entry.kind)
    }

    /// All catalog names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &UnitName> {
        self.entries.keys()
    }

    /// Units that start a release walk: proxied core contracts, in
    /// sorted order. Libraries are reached through dependency edges.
    pub fn release_roots(&self) -> Vec<UnitName> {
        self.entries
            .values()
            .filter(|entry| entry.kind == UnitKind::CoreContract && entry.proxied)
            .map(|entry| entry.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> UnitName {
        UnitName::new(s).unwrap()
    }

    fn sample_catalog() -> UnitCatalog {
        UnitCatalog::new(vec![
            CatalogEntry::core_contract(name("Exchange"), true),
            CatalogEntry::core_contract(name("Governance"), true),
            CatalogEntry::core_contract(name("Registry"), true),
            CatalogEntry::core_contract(name("EpochRewards"), false),
            CatalogEntry::library(name("LinkedList")),
        ])
    }

    #[test]
    fn lookup_by_name() {
        let catalog = sample_catalog();
        assert!(catalog.contains(&name("Exchange")));
        assert!(!catalog.contains(&name("Unknown")));
        assert_eq!(catalog.kind_of(&name("LinkedList")), Some(UnitKind::Library));
        assert_eq!(
            catalog.kind_of(&name("Exchange")),
            Some(UnitKind::CoreContract)
        );
        assert_eq!(catalog.kind_of(&name("Unknown")), None);
    }

    #[test]
    fn names_are_sorted() {
        let catalog = sample_catalog();
        let names: Vec<&str> = catalog.names().map(UnitName::as_str).collect();
        assert_eq!(
            names,
            vec![
                "EpochRewards",
                "Exchange",
                "Governance",
                "LinkedList",
                "Registry"
            ]
        );
    }

    #[test]
    fn roots_are_proxied_core_contracts() {
        let catalog = sample_catalog();
        let roots = catalog.release_roots();
        let names: Vec<&str> = roots.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["Exchange", "Governance", "Registry"]);
    }

    #[test]
    fn duplicate_entries_replace() {
        let catalog = UnitCatalog::new(vec![
            CatalogEntry::core_contract(name("Exchange"), false),
            CatalogEntry::core_contract(name("Exchange"), true),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.release_roots().len(), 1);
    }

    #[test]
    fn well_known_names() {
        assert_eq!(UnitCatalog::governance().as_str(), "Governance");
        assert_eq!(UnitCatalog::registry().as_str(), "Registry");
    }
}
