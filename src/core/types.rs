//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`UnitName`] - Validated release unit (contract or library) name
//! - [`Address`] - 20-byte account address, strict hex parsing
//! - [`UnitKind`] - Whether a unit is a core contract or a linked library
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs. In
//! particular there is no way to observe a "default" zero address by
//! accident: [`Address::zero`] must be asked for by name.
//!
//! # Examples
//!
//! ```
//! use stagehand::core::types::{Address, UnitName};
//!
//! // Valid constructions
//! let unit = UnitName::new("LinkedList").unwrap();
//! let addr = Address::from_hex("0x000000000000000000000000000000000000ce10").unwrap();
//!
//! // Proxy companion naming
//! assert_eq!(unit.proxy().as_str(), "LinkedListProxy");
//!
//! // Invalid constructions fail at creation time
//! assert!(UnitName::new("not a name").is_err());
//! assert!(Address::from_hex("ce10").is_err());
//! ```

use ethers_core::types::H160;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid unit name: {0}")]
    InvalidUnitName(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// A validated release unit name.
///
/// Unit names are contract identifiers as they appear in compiled
/// artifacts and in the on-chain registry:
/// - Cannot be empty
/// - Must start with an ASCII letter or `_`
/// - May contain only ASCII letters, digits, and `_`
///
/// # Example
///
/// ```
/// use stagehand::core::types::UnitName;
///
/// // Valid unit names
/// let name = UnitName::new("Exchange").unwrap();
/// assert_eq!(name.as_str(), "Exchange");
///
/// let lib = UnitName::new("Signature_Utils").unwrap();
/// assert_eq!(lib.as_str(), "Signature_Utils");
///
/// // Invalid unit names
/// assert!(UnitName::new("").is_err());
/// assert!(UnitName::new("9Lives").is_err());
/// assert!(UnitName::new("has space").is_err());
/// assert!(UnitName::new("dotted.name").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitName(String);

impl UnitName {
    /// Create a new validated unit name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidUnitName` if the name is not a valid
    /// contract identifier.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Build a name from a compile-time constant known to satisfy the rules.
    pub(crate) fn from_const(name: &'static str) -> Self {
        debug_assert!(Self::validate(name).is_ok());
        Self(name.to_string())
    }

    /// Validate a unit name against contract identifier rules.
    fn validate(name: &str) -> Result<(), TypeError> {
        // Cannot be empty
        if name.is_empty() {
            return Err(TypeError::InvalidUnitName(
                "unit name cannot be empty".into(),
            ));
        }

        // Must start with a letter or underscore
        if !name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            return Err(TypeError::InvalidUnitName(
                "unit name must start with a letter or '_'".into(),
            ));
        }

        // Remaining characters: letters, digits, underscores
        for c in name.chars() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                return Err(TypeError::InvalidUnitName(format!(
                    "unit name cannot contain '{c}'"
                )));
            }
        }

        Ok(())
    }

    /// The name of this unit's proxy companion (`<name>Proxy`).
    ///
    /// # Example
    ///
    /// ```
    /// use stagehand::core::types::UnitName;
    ///
    /// let unit = UnitName::new("Exchange").unwrap();
    /// assert_eq!(unit.proxy().as_str(), "ExchangeProxy");
    /// ```
    pub fn proxy(&self) -> UnitName {
        // Safe because unit names are validated and the Proxy suffix is valid
        Self(format!("{}Proxy", self.0))
    }

    /// If this name is a proxy companion (`<base>Proxy`), return the base name.
    ///
    /// Returns `None` for names that do not end in `Proxy`, and for the bare
    /// name `Proxy` itself.
    ///
    /// # Example
    ///
    /// ```
    /// use stagehand::core::types::UnitName;
    ///
    /// let proxy = UnitName::new("ExchangeProxy").unwrap();
    /// assert_eq!(proxy.proxy_base().unwrap().as_str(), "Exchange");
    ///
    /// let unit = UnitName::new("Exchange").unwrap();
    /// assert!(unit.proxy_base().is_none());
    /// ```
    pub fn proxy_base(&self) -> Option<UnitName> {
        let base = self.0.strip_suffix("Proxy")?;
        if base.is_empty() {
            return None;
        }
        // Safe because a validated name minus a suffix is still valid
        Some(Self(base.to_string()))
    }

    /// Get the unit name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UnitName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<UnitName> for String {
    fn from(name: UnitName) -> Self {
        name.0
    }
}

impl AsRef<str> for UnitName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UnitName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 20-byte Ethereum account address.
///
/// Addresses are parsed strictly (`0x` prefix plus exactly 40 hex
/// characters) and rendered lowercase. The zero address is representable
/// but only by explicit construction; it carries "not registered"
/// semantics at the registry boundary and never acts as a default.
///
/// # Example
///
/// ```
/// use stagehand::core::types::Address;
///
/// // Parsing normalizes to lowercase
/// let addr = Address::from_hex("0x000000000000000000000000000000000000CE10").unwrap();
/// assert_eq!(addr.to_hex(), "0x000000000000000000000000000000000000ce10");
///
/// // The zero address is explicit
/// let zero = Address::zero();
/// assert!(zero.is_zero());
/// assert!(!addr.is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(H160);

impl Address {
    /// Parse an address from a `0x`-prefixed hex string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidAddress` if the prefix is missing, the
    /// length is wrong, or a character is not hexadecimal.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let lower = s.to_ascii_lowercase();
        let digits = lower.strip_prefix("0x").ok_or_else(|| {
            TypeError::InvalidAddress("address must start with '0x'".into())
        })?;
        if digits.len() != 40 {
            return Err(TypeError::InvalidAddress(format!(
                "expected 40 hex characters after '0x', got {}",
                digits.len()
            )));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidAddress(
                "address must be hexadecimal".into(),
            ));
        }
        let bytes = hex::decode(digits).map_err(|e| TypeError::InvalidAddress(e.to_string()))?;
        Ok(Self(H160::from_slice(&bytes)))
    }

    /// The zero address (`0x0000…0000`).
    ///
    /// The registry returns this for names it has never seen.
    pub fn zero() -> Self {
        Self(H160::zero())
    }

    /// Check whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The underlying 20-byte hash type.
    pub fn h160(&self) -> H160 {
        self.0
    }

    /// The raw address bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Render as a `0x`-prefixed lowercase hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_bytes()))
    }
}

impl From<H160> for Address {
    fn from(raw: H160) -> Self {
        Self(raw)
    }
}

impl TryFrom<String> for Address {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_hex()
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Whether a unit is a proxied core contract or a linked library.
///
/// Core contracts live behind proxies and upgrade via governance
/// proposals; libraries are linked into dependents by address and
/// retarget on redeploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    CoreContract,
    Library,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::CoreContract => write!(f, "core-contract"),
            UnitKind::Library => write!(f, "library"),
        }
    }
}
