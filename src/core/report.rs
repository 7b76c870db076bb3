//! core::report
//!
//! Compatibility report parsing and per-unit change classification.
//!
//! # Format
//!
//! The report is produced upstream by diffing the previously released
//! source tree against the working tree. It is a JSON document with two
//! maps keyed by unit name:
//!
//! ```json
//! {
//!   "contracts": {
//!     "Exchange": {
//!       "changes": {
//!         "storage": [{ "type": "VariableAdded", "description": "..." }],
//!         "major": [{ "type": "MethodRemoved", "description": "..." }]
//!       }
//!     }
//!   },
//!   "libraries": {
//!     "LinkedList": { "changes": { "storage": [], "major": [] } }
//!   }
//! }
//! ```
//!
//! Units absent from both maps are unchanged. A unit present in both maps
//! is a data error, not a precedence question.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{TypeError, UnitKind, UnitName};

/// Errors from report loading.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read report from {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse report: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("report lists '{0}' as both a contract and a library")]
    ConflictingKind(UnitName),

    #[error("report entry has an invalid name: {0}")]
    InvalidName(#[from] TypeError),
}

/// One storage layout diff entry.
///
/// The presence of any entry forces a proxy replacement; the fields are
/// carried for operator-facing output only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChange {
    /// Diff entry kind as reported by the layout checker, e.g. "VariableAdded".
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub description: String,
}

/// Interface-level change categories the upstream checker reports.
///
/// Only [`MajorChangeKind::NewContract`] drives a release decision;
/// unrecognized categories fold into [`MajorChangeKind::Other`] rather
/// than failing the parse, since the checker grows categories faster
/// than this tool needs to understand them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MajorChangeKind {
    NewContract,
    MethodRemoved,
    MethodMutability,
    MethodReturn,
    MethodVisibility,
    #[serde(other)]
    Other,
}

/// One interface diff entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorChange {
    #[serde(rename = "type")]
    pub kind: MajorChangeKind,

    #[serde(default)]
    pub description: String,
}

impl MajorChange {
    pub fn new(kind: MajorChangeKind) -> Self {
        Self {
            kind,
            description: String::new(),
        }
    }
}

/// A changed unit: its kind plus the change evidence driving the
/// release decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitChange {
    kind: UnitKind,
    storage: Vec<StorageChange>,
    major: Vec<MajorChange>,
}

impl UnitChange {
    pub fn new(kind: UnitKind, storage: Vec<StorageChange>, major: Vec<MajorChange>) -> Self {
        Self {
            kind,
            storage,
            major,
        }
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn storage(&self) -> &[StorageChange] {
        &self.storage
    }

    pub fn major(&self) -> &[MajorChange] {
        &self.major
    }

    /// Whether the storage layout diverged from the released version.
    pub fn has_storage_changes(&self) -> bool {
        !self.storage.is_empty()
    }

    /// Whether the unit has never been released on this chain.
    pub fn is_new_unit(&self) -> bool {
        self.major
            .iter()
            .any(|change| change.kind == MajorChangeKind::NewContract)
    }
}

// Wire format. Collapsed into `UnitChange` entries at load so the rest
// of the crate never sees the two-map split.

#[derive(Debug, Default, Deserialize)]
struct RawReport {
    #[serde(default)]
    contracts: BTreeMap<String, RawEntry>,

    #[serde(default)]
    libraries: BTreeMap<String, RawEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    #[serde(default)]
    changes: RawChanges,
}

#[derive(Debug, Default, Deserialize)]
struct RawChanges {
    #[serde(default)]
    storage: Vec<StorageChange>,

    #[serde(default)]
    major: Vec<MajorChange>,
}

/// The parsed compatibility report: changed units only.
///
/// # Example
///
/// ```
/// use stagehand::core::report::ChangeReport;
/// use stagehand::core::types::UnitName;
///
/// let report = ChangeReport::from_json_str(
///     r#"{"contracts": {"Exchange": {"changes": {"storage": [], "major": []}}}}"#,
/// )
/// .unwrap();
///
/// let exchange = UnitName::new("Exchange").unwrap();
/// let change = report.get(&exchange).unwrap();
/// assert!(!change.has_storage_changes());
/// assert!(!change.is_new_unit());
///
/// // Unchanged units are simply absent
/// assert!(report.get(&UnitName::new("Reserve").unwrap()).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChangeReport {
    entries: BTreeMap<UnitName, UnitChange>,
}

impl ChangeReport {
    /// Load and parse a report file.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReportError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parse a report from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ReportError> {
        let raw: RawReport = serde_json::from_str(json)?;

        let mut entries = BTreeMap::new();
        for (name, entry) in raw.contracts {
            let name = UnitName::new(name)?;
            entries.insert(
                name,
                UnitChange::new(
                    UnitKind::CoreContract,
                    entry.changes.storage,
                    entry.changes.major,
                ),
            );
        }
        for (name, entry) in raw.libraries {
            let name = UnitName::new(name)?;
            if entries.contains_key(&name) {
                return Err(ReportError::ConflictingKind(name));
            }
            entries.insert(
                name,
                UnitChange::new(UnitKind::Library, entry.changes.storage, entry.changes.major),
            );
        }

        Ok(Self { entries })
    }

    /// Build a report directly from classified entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (UnitName, UnitChange)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Look up the change entry for a unit. `None` means unchanged.
    pub fn get(&self, name: &UnitName) -> Option<&UnitChange> {
        self.entries.get(name)
    }

    /// Names of all changed units, in sorted order.
    pub fn units(&self) -> impl Iterator<Item = &UnitName> {
        self.entries.keys()
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

    #[test]
    fn parses_contracts_and_libraries() {
        let report = ChangeReport::from_json_str(
            r#"{
                "contracts": {
                    "Exchange": {
                        "changes": {
                            "storage": [{"type": "VariableAdded", "description": "bucket"}],
                            "major": []
                        }
                    }
                },
                "libraries": {
                    "LinkedList": {
                        "changes": {"storage": [], "major": []}
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(report.len(), 2);

        let exchange = report.get(&name("Exchange")).unwrap();
        assert_eq!(exchange.kind(), UnitKind::CoreContract);
        assert!(exchange.has_storage_changes());

        let list = report.get(&name("LinkedList")).unwrap();
        assert_eq!(list.kind(), UnitKind::Library);
        assert!(!list.has_storage_changes());
    }

    #[test]
    fn empty_report() {
        let report = ChangeReport::from_json_str("{}").unwrap();
        assert!(report.is_empty());
        assert!(report.get(&name("Exchange")).is_none());
    }

    #[test]
    fn missing_changes_default_to_empty() {
        let report =
            ChangeReport::from_json_str(r#"{"contracts": {"Exchange": {}}}"#).unwrap();
        let change = report.get(&name("Exchange")).unwrap();
        assert!(!change.has_storage_changes());
        assert!(!change.is_new_unit());
    }

    #[test]
    fn new_contract_marker_detected() {
        let report = ChangeReport::from_json_str(
            r#"{
                "contracts": {
                    "Attestations": {
                        "changes": {
                            "storage": [],
                            "major": [{"type": "NewContract"}]
                        }
                    }
                }
            }"#,
        )
        .unwrap();
        assert!(report.get(&name("Attestations")).unwrap().is_new_unit());
    }

    #[test]
    fn unknown_major_kind_folds_to_other() {
        let report = ChangeReport::from_json_str(
            r#"{
                "contracts": {
                    "Exchange": {
                        "changes": {
                            "major": [{"type": "SomethingFromTheFuture"}]
                        }
                    }
                }
            }"#,
        )
        .unwrap();
        let change = report.get(&name("Exchange")).unwrap();
        assert_eq!(change.major()[0].kind, MajorChangeKind::Other);
        assert!(!change.is_new_unit());
    }

    #[test]
    fn conflicting_kind_rejected() {
        let result = ChangeReport::from_json_str(
            r#"{
                "contracts": {"LinkedList": {}},
                "libraries": {"LinkedList": {}}
            }"#,
        );
        assert!(matches!(result, Err(ReportError::ConflictingKind(n)) if n.as_str() == "LinkedList"));
    }

    #[test]
    fn invalid_unit_name_rejected() {
        let result = ChangeReport::from_json_str(r#"{"contracts": {"not a name": {}}}"#);
        assert!(matches!(result, Err(ReportError::InvalidName(_))));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            ChangeReport::from_json_str("{"),
            Err(ReportError::ParseError(_))
        ));
    }

    #[test]
    fn units_are_sorted() {
        let report = ChangeReport::from_json_str(
            r#"{"contracts": {"Reserve": {}, "Attestations": {}, "Exchange": {}}}"#,
        )
        .unwrap();
        let names: Vec<&str> = report.units().map(UnitName::as_str).collect();
        assert_eq!(names, vec!["Attestations", "Exchange", "Reserve"]);
    }
}
