//! release::proposal
//!
//! Governance proposal assembly.
//!
//! # Architecture
//!
//! The proposal is the run's sole output artifact: an ordered list of
//! governance transactions that, once passed, switch the network over to
//! the freshly deployed contracts. The builder is append-only. Nothing
//! reorders, dedups, or rewrites transactions after they are appended,
//! because ordering is load-bearing: a proxy's registry entry must exist
//! before anything routes calls through it, and an implementation must
//! never be installed before the transaction that initializes it.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use stagehand::core::types::UnitName;
//! use stagehand::release::proposal::{ProposalBuilder, ProposalTx};
//!
//! let mut proposal = ProposalBuilder::new();
//! proposal.append(ProposalTx::new(
//!     UnitName::new("ExchangeProxy").unwrap(),
//!     "setImplementation",
//!     vec![json!("0x5409ed021d9299bf6814279a6a1411a7e866a631")],
//! ));
//!
//! assert_eq!(proposal.len(), 1);
//! assert!(proposal.digest().starts_with("sha256:"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::core::types::UnitName;

fn default_value() -> String {
    "0".to_string()
}

/// One governance transaction.
///
/// The target is a unit name, not an address: the governance executor
/// resolves names against the registry at execution time, which keeps
/// proposals readable and survivable across re-registrations that happen
/// between submission and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTx {
    /// Unit the call is addressed to.
    pub target: UnitName,

    /// Function name on the target, e.g. `setImplementation`.
    pub function: String,

    /// Call arguments as JSON values, in signature order.
    pub args: Vec<Value>,

    /// Attached value in wei, as a decimal string.
    #[serde(default = "default_value")]
    pub value: String,

    /// Operator-facing summary line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProposalTx {
    /// Create a transaction with no attached value.
    pub fn new(target: UnitName, function: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            target,
            function: function.into(),
            args,
            value: default_value(),
            description: None,
        }
    }

    /// Attach a summary line (builder pattern).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// One-line summary for previews.
    pub fn summary(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => format!(
                "{}.{}({} arg(s))",
                self.target,
                self.function,
                self.args.len()
            ),
        }
    }
}

/// An append-only sequence of governance transactions.
#[derive(Debug, Clone, Default)]
pub struct ProposalBuilder {
    transactions: Vec<ProposalTx>,
}

impl ProposalBuilder {
    /// Create an empty proposal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction. Position is final.
    pub fn append(&mut self, tx: ProposalTx) {
        self.transactions.push(tx);
    }

    /// The transactions appended so far, in order.
    pub fn transactions(&self) -> &[ProposalTx] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Consume the builder and return the ordered sequence verbatim.
    pub fn finalize(self) -> Vec<ProposalTx> {
        self.transactions
    }

    /// Digest of the canonical JSON serialization.
    ///
    /// Lets an operator confirm the file they are submitting is the one
    /// the run printed.
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_string(&self.transactions).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    /// Numbered human-readable listing for confirmation output.
    pub fn preview(&self) -> String {
        if self.transactions.is_empty() {
            return "proposal: no governance transactions needed".to_string();
        }

        let mut lines = vec![format!(
            "proposal ({} transaction(s)):",
            self.transactions.len()
        )];
        for (i, tx) in self.transactions.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, tx.summary()));
        }
        lines.join("\n")
    }

    /// Pretty JSON array for persistence.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.transactions)
    }
}
