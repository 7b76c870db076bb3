//! abi
//!
//! Initializer call encoding.
//!
//! # Overview
//!
//! When a new proxy is stood up, its first governance transaction may
//! fold implementation wiring and initialization into one atomic call.
//! The initializer arguments arrive as JSON (one array per unit) and are
//! encoded against the `initialize` function the artifact declares.
//!
//! # JSON to ABI mapping
//!
//! - `address`: `0x`-prefixed 40-hex string
//! - `uint*`: JSON number, decimal string, or `0x`-hex string
//! - `int*`: as `uint*`; negative values are rejected
//! - `bool`: JSON bool
//! - `string`: JSON string
//! - `bytes` / `bytesN`: `0x`-prefixed hex string
//! - arrays: JSON array of the element mapping, recursively
//!
//! Anything that does not fit produces an error naming the unit, the
//! argument position, the expected ABI type, and the actual JSON shape.
//! Encoding failures are fatal to a release run, so the messages do the
//! diagnostic work.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ethers_core::abi::{Function, ParamType, Token};
use ethers_core::types::U256;
use serde_json::Value;
use thiserror::Error;

use crate::core::types::{Address, UnitName};

/// Errors from initializer argument handling.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to read initializer args from {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse initializer args: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("initializer for '{unit}' expects {expected} argument(s) for {signature}, got {actual}")]
    ArgumentCount {
        unit: UnitName,
        signature: String,
        expected: usize,
        actual: usize,
    },

    #[error("initializer argument {index} for '{unit}' must be {expected}, got {actual}")]
    ArgumentShape {
        unit: UnitName,
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("failed to encode initializer call for '{unit}': {message}")]
    Encode { unit: UnitName, message: String },
}

/// Per-unit initializer arguments, keyed by unit name.
///
/// The file format is one JSON object mapping unit names to argument
/// arrays:
///
/// ```json
/// {
///   "Exchange": ["0x000000000000000000000000000000000000ce10", "5000000000000000000000"],
///   "Reserve": []
/// }
/// ```
///
/// Units without an entry have zero arguments; if their initializer
/// expects more, encoding fails with an argument count error.
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    args: BTreeMap<UnitName, Vec<Value>>,
}

impl InitArgs {
    /// Load initializer arguments from a JSON file.
    pub fn load(path: &Path) -> Result<Self, EncodeError> {
        let text = std::fs::read_to_string(path).map_err(|source| EncodeError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parse initializer arguments from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, EncodeError> {
        let args: BTreeMap<UnitName, Vec<Value>> = serde_json::from_str(json)?;
        Ok(Self { args })
    }

    pub fn insert(&mut self, unit: UnitName, args: Vec<Value>) {
        self.args.insert(unit, args);
    }

    /// Arguments for a unit. Units without an entry have none.
    pub fn get(&self, unit: &UnitName) -> &[Value] {
        self.args.get(unit).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Human-readable signature of a function, e.g.
/// `initialize(address,uint256)`.
pub fn signature(function: &Function) -> String {
    let params: Vec<String> = function
        .inputs
        .iter()
        .map(|param| param.kind.to_string())
        .collect();
    format!("{}({})", function.name, params.join(","))
}

/// Encode a call to `function` with JSON arguments.
///
/// Returns the full calldata (selector plus encoded arguments).
///
/// # Errors
///
/// Fails with a descriptive error if the argument count or any argument
/// shape does not match the function's inputs.
pub fn encode_initializer_call(
    unit: &UnitName,
    function: &Function,
    args: &[Value],
) -> Result<Vec<u8>, EncodeError> {
    if function.inputs.len() != args.len() {
        return Err(EncodeError::ArgumentCount {
            unit: unit.clone(),
            signature: signature(function),
            expected: function.inputs.len(),
            actual: args.len(),
        });
    }

    let mut tokens = Vec::with_capacity(args.len());
    for (index, (param, value)) in function.inputs.iter().zip(args).enumerate() {
        let token =
            token_from_json(&param.kind, value).map_err(|m| EncodeError::ArgumentShape {
                unit: unit.clone(),
                index,
                expected: m.expected,
                actual: m.actual,
            })?;
        tokens.push(token);
    }

    function
        .encode_input(&tokens)
        .map_err(|e| EncodeError::Encode {
            unit: unit.clone(),
            message: e.to_string(),
        })
}

/// An argument that does not fit its parameter type.
#[derive(Debug)]
struct Mismatch {
    expected: String,
    actual: String,
}

impl Mismatch {
    fn new(kind: &ParamType, value: &Value) -> Self {
        Self {
            expected: kind.to_string(),
            actual: describe(value),
        }
    }

    fn with_actual(kind: &ParamType, actual: impl Into<String>) -> Self {
        Self {
            expected: kind.to_string(),
            actual: actual.into(),
        }
    }
}

/// Convert one JSON value into an ABI token of the given type.
fn token_from_json(kind: &ParamType, value: &Value) -> Result<Token, Mismatch> {
    match kind {
        ParamType::Address => match value {
            Value::String(s) => Address::from_hex(s)
                .map(|addr| Token::Address(addr.h160()))
                .map_err(|_| Mismatch::new(kind, value)),
            _ => Err(Mismatch::new(kind, value)),
        },

        ParamType::Uint(_) => parse_uint(kind, value).map(Token::Uint),

        ParamType::Int(_) => parse_uint(kind, value).map(Token::Int),

        ParamType::Bool => match value {
            Value::Bool(b) => Ok(Token::Bool(*b)),
            _ => Err(Mismatch::new(kind, value)),
        },

        ParamType::String => match value {
            Value::String(s) => Ok(Token::String(s.clone())),
            _ => Err(Mismatch::new(kind, value)),
        },

        ParamType::Bytes => parse_hex_bytes(kind, value).map(Token::Bytes),

        ParamType::FixedBytes(len) => {
            let bytes = parse_hex_bytes(kind, value)?;
            if bytes.len() != *len {
                return Err(Mismatch::with_actual(
                    kind,
                    format!("{} byte(s) of data", bytes.len()),
                ));
            }
            Ok(Token::FixedBytes(bytes))
        }

        ParamType::Array(inner) => match value {
            Value::Array(items) => {
                let tokens = items
                    .iter()
                    .map(|item| token_from_json(inner, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Token::Array(tokens))
            }
            _ => Err(Mismatch::new(kind, value)),
        },

        ParamType::FixedArray(inner, len) => match value {
            Value::Array(items) if items.len() == *len => {
                let tokens = items
                    .iter()
                    .map(|item| token_from_json(inner, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Token::FixedArray(tokens))
            }
            Value::Array(items) => Err(Mismatch::with_actual(
                kind,
                format!("array of {} item(s)", items.len()),
            )),
            _ => Err(Mismatch::new(kind, value)),
        },

        ParamType::Tuple(_) => Err(Mismatch::with_actual(
            kind,
            "a tuple (tuple parameters are not supported)",
        )),
    }
}

// Numbers arrive as JSON numbers or as strings (decimal or 0x-hex).
// Negative values are rejected; the tooling upstream never passes them
// and guessing a two's-complement width silently is worse than failing.
fn parse_uint(kind: &ParamType, value: &Value) -> Result<U256, Mismatch> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(v) => Ok(U256::from(v)),
            None => Err(Mismatch::new(kind, value)),
        },
        Value::String(s) => {
            let parsed = match s.strip_prefix("0x") {
                Some(digits) => U256::from_str_radix(digits, 16).ok(),
                None => U256::from_dec_str(s).ok(),
            };
            parsed.ok_or_else(|| Mismatch::new(kind, value))
        }
        _ => Err(Mismatch::new(kind, value)),
    }
}

fn parse_hex_bytes(kind: &ParamType, value: &Value) -> Result<Vec<u8>, Mismatch> {
    match value {
        Value::String(s) => {
            let digits = s
                .strip_prefix("0x")
                .ok_or_else(|| Mismatch::new(kind, value))?;
            hex::decode(digits).map_err(|_| Mismatch::new(kind, value))
        }
        _ => Err(Mismatch::new(kind, value)),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string \"{s}\""),
        Value::Array(items) => format!("array of {} item(s)", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}
