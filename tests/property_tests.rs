//! Property-based tests for the core value types and data structures.
//!
//! These pin down the invariants the release pipeline leans on: name and
//! address validation, last-write-wins table semantics, dependency-order
//! preservation in the graph, bytecode linking, and proposal digest
//! stability.

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::json;

use stagehand::core::artifact::Artifact;
use stagehand::core::graph::DependencyGraph;
use stagehand::core::types::{Address, UnitName};
use stagehand::release::{AddressTable, ProposalBuilder, ProposalTx};

/// A fixed pool of unit names for table and graph properties.
const POOL: [&str; 5] = [
    "Exchange",
    "Registry",
    "Attestations",
    "LinkedList",
    "SortedOracles",
];

fn name(s: &str) -> UnitName {
    UnitName::new(s).unwrap()
}

/// Strategy for valid unit names (identifier rules).
fn unit_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,30}"
}

/// Strategy for well-formed lowercase address strings.
fn address_strategy() -> impl Strategy<Value = String> {
    "0x[0-9a-f]{40}"
}

/// Strategy for library names that fit a 40-character link placeholder.
fn library_name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9]{0,20}"
}

// =============================================================================
// Names and addresses
// =============================================================================

proptest! {
    /// Valid unit names survive a serde round-trip unchanged.
    #[test]
    fn unit_name_serde_roundtrip(raw in unit_name_strategy()) {
        let unit = UnitName::new(&raw).unwrap();
        let json = serde_json::to_string(&unit).unwrap();
        let parsed: UnitName = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(unit, parsed);
    }

    /// Every name's proxy companion strips back to the name itself.
    #[test]
    fn proxy_companions_strip_back_to_their_base(raw in unit_name_strategy()) {
        let unit = UnitName::new(&raw).unwrap();
        let proxy = unit.proxy();
        prop_assert!(proxy.as_str().ends_with("Proxy"));
        prop_assert_eq!(proxy.proxy_base(), Some(unit));
    }

    /// Well-formed addresses round-trip through parse and display.
    #[test]
    fn address_roundtrips_through_hex(raw in address_strategy()) {
        let address = Address::from_hex(&raw).unwrap();
        prop_assert_eq!(address.to_hex(), raw.clone());

        let json = serde_json::to_string(&address).unwrap();
        let parsed: Address = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(address, parsed);
    }

    /// Checksummed or shouting input normalizes to lowercase.
    #[test]
    fn address_parsing_normalizes_case(raw in "0x[0-9A-F]{40}") {
        let address = Address::from_hex(&raw).unwrap();
        prop_assert_eq!(address.to_hex(), raw.to_lowercase());
    }

    /// Anything that is not exactly 20 bytes of hex is rejected.
    #[test]
    fn wrong_width_addresses_are_rejected(hex in "[0-9a-f]{1,80}") {
        prop_assume!(hex.len() != 40);
        let raw = format!("0x{hex}");
        prop_assert!(Address::from_hex(&raw).is_err());
    }
}

// =============================================================================
// Address table
// =============================================================================

proptest! {
    /// For every name, `get` answers the most recent `set`; names never
    /// written stay unknown.
    #[test]
    fn table_returns_the_last_write_per_name(
        writes in prop::collection::vec((0usize..POOL.len(), address_strategy()), 0..24)
    ) {
        let mut table = AddressTable::new();
        for (slot, raw) in &writes {
            table.set(name(POOL[*slot]), Address::from_hex(raw).unwrap());
        }

        for (slot, unit) in POOL.iter().enumerate() {
            match writes.iter().rev().find(|(s, _)| *s == slot) {
                Some((_, raw)) => prop_assert_eq!(
                    table.get(&name(unit)).unwrap(),
                    Address::from_hex(raw).unwrap()
                ),
                None => prop_assert!(table.get(&name(unit)).is_err()),
            }
        }
    }
}

// =============================================================================
// Dependency graph
// =============================================================================

proptest! {
    /// Dependency lists keep first-appearance order with duplicates
    /// dropped, exactly as the bytecode scan produces them.
    #[test]
    fn graph_preserves_first_appearance_order(
        deps in prop::collection::vec(0usize..POOL.len(), 0..24)
    ) {
        let mut graph = DependencyGraph::new();
        graph.add_unit(
            name("Root"),
            deps.iter().map(|i| name(POOL[*i])).collect(),
        );

        let mut expected: Vec<UnitName> = Vec::new();
        for i in &deps {
            let dep = name(POOL[*i]);
            if !expected.contains(&dep) {
                expected.push(dep);
            }
        }
        prop_assert_eq!(graph.dependencies_of(&name("Root")), expected.as_slice());
    }
}

// =============================================================================
// Bytecode linking
// =============================================================================

proptest! {
    /// Linking swaps each 40-character placeholder for exactly 40 hex
    /// characters of address, leaving clean deployable bytecode.
    #[test]
    fn linking_replaces_placeholders_width_for_width(
        library in library_name_strategy(),
        raw in address_strategy(),
    ) {
        let placeholder = format!("__{library:_<38}");
        let bytecode = format!("0x6060{placeholder}6040");
        let artifact = Artifact::from_json_str(
            &json!({
                "contractName": "Exchange",
                "abi": [],
                "bytecode": bytecode,
            })
            .to_string(),
        )
        .unwrap();

        let address = Address::from_hex(&raw).unwrap();
        let mut addresses = BTreeMap::new();
        addresses.insert(name(&library), address);

        let linked = artifact.link(&addresses).unwrap();
        prop_assert_eq!(linked.len(), bytecode.len());
        prop_assert!(linked.contains(&hex::encode(address.as_bytes())));
        prop_assert!(!linked.contains('_'));
    }
}

// =============================================================================
// Proposal digests
// =============================================================================

fn build_proposal(functions: &[String], args: &[String]) -> ProposalBuilder {
    let mut proposal = ProposalBuilder::new();
    for function in functions {
        proposal.append(ProposalTx::new(
            name("Registry"),
            function.clone(),
            args.iter().map(|a| json!(a)).collect(),
        ));
    }
    proposal
}

proptest! {
    /// Equal content digests equally, whenever and wherever computed.
    #[test]
    fn digests_are_stable_for_equal_content(
        functions in prop::collection::vec("[a-z]{1,12}", 1..6),
        args in prop::collection::vec("[a-z0-9]{0,16}", 0..4),
    ) {
        let first = build_proposal(&functions, &args);
        let second = build_proposal(&functions, &args);
        prop_assert_eq!(first.digest(), second.digest());
    }

    /// Different argument lists digest differently.
    #[test]
    fn digests_distinguish_different_content(
        functions in prop::collection::vec("[a-z]{1,12}", 1..6),
        left in prop::collection::vec("[a-z0-9]{0,16}", 0..4),
        right in prop::collection::vec("[a-z0-9]{0,16}", 0..4),
    ) {
        prop_assume!(left != right);
        let first = build_proposal(&functions, &left);
        let second = build_proposal(&functions, &right);
        prop_assert_ne!(first.digest(), second.digest());
    }
}

// =============================================================================
// Deterministic checks
// =============================================================================

mod digest_definition {
    use sha2::{Digest, Sha256};

    use super::*;

    /// The digest is pinned to sha256 over the serialized transaction
    /// array, so externally stored digests stay comparable.
    #[test]
    fn digest_matches_the_documented_construction() {
        let mut proposal = ProposalBuilder::new();
        proposal.append(ProposalTx::new(
            name("Registry"),
            "setAddressFor",
            vec![
                json!("Exchange"),
                json!("0x00000000000000000000000000000000000000d1"),
            ],
        ));

        let serialized = serde_json::to_string(proposal.transactions()).unwrap();
        let expected = format!(
            "sha256:{}",
            hex::encode(Sha256::digest(serialized.as_bytes()))
        );
        assert_eq!(proposal.digest(), expected);
    }

    #[test]
    fn empty_proposals_still_digest() {
        let proposal = ProposalBuilder::new();
        assert!(proposal.digest().starts_with("sha256:"));
        assert_eq!(proposal.digest(), ProposalBuilder::new().digest());
    }
}
