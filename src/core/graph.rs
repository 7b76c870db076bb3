//! core::graph
//!
//! Dependency graph between release units.
//!
//! # Architecture
//!
//! The graph is derived from compiled artifacts: a unit depends on every
//! library its bytecode links against. Edges point from dependent to
//! dependency, and per-unit edge order is the placeholder order in the
//! bytecode, so a release walk over the same build is reproducible.
//!
//! # Invariants
//!
//! - Per-unit edges keep first-appearance order, deduplicated
//! - The graph does not reject cycles; the release walk detects them
//!   when it re-enters a unit that is still in progress

use std::collections::BTreeMap;

use super::artifact::UnitSet;
use super::types::UnitName;

/// Dependency lists for every known unit.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    deps: BTreeMap<UnitName, Vec<UnitName>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every loaded unit's link references.
    pub fn from_units(units: &UnitSet) -> Self {
        let mut graph = Self::new();
        for unit in units.units() {
            graph.add_unit(unit.name.clone(), unit.artifact.link_references());
        }
        graph
    }

    /// Record a unit and its ordered dependencies.
    ///
    /// Duplicates in `deps` are dropped after their first appearance.
    ///
    /// # Example
    ///
    /// ```
    /// use stagehand::core::graph::DependencyGraph;
    /// use stagehand::core::types::UnitName;
    ///
    /// let mut graph = DependencyGraph::new();
    /// let exchange = UnitName::new("Exchange").unwrap();
    /// let list = UnitName::new("LinkedList").unwrap();
    ///
    /// graph.add_unit(exchange.clone(), vec![list.clone()]);
    ///
    /// assert_eq!(graph.dependencies_of(&exchange), &[list]);
    /// let reserve = UnitName::new("Reserve").unwrap();
    /// assert!(graph.dependencies_of(&reserve).is_empty());
    /// ```
    pub fn add_unit(&mut self, unit: UnitName, deps: Vec<UnitName>) {
        let mut unique = Vec::with_capacity(deps.len());
        for dep in deps {
            if !unique.contains(&dep) {
                unique.push(dep);
            }
        }
        self.deps.insert(unit, unique);
    }

    /// The ordered dependencies of a unit.
    ///
    /// Units without a recorded list (including units the graph has
    /// never seen) have no dependencies.
    pub fn dependencies_of(&self, unit: &UnitName) -> &[UnitName] {
        self.deps.get(unit).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, unit: &UnitName) -> bool {
        self.deps.contains_key(unit)
    }

    /// All units with recorded dependency lists, in sorted order.
    pub fn units(&self) -> impl Iterator<Item = &UnitName> {
        self.deps.keys()
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }
}
