//! chain::jsonrpc
//!
//! JSON-RPC chain backend for unlocked-account nodes.
//!
//! # Design
//!
//! Transactions are signed node-side via `eth_sendTransaction`, so the
//! configured sender must be unlocked on the node (the same operational
//! model the upstream release tooling assumes). Deployments fetch the
//! sender's pending nonce first and derive the contract address from
//! `(sender, nonce)`; there is no receipt polling, the run never waits
//! for inclusion.
//!
//! Registry lookups are read-only `eth_call`s of
//! `getAddressForString(string)` against the configured registry
//! directory contract.
//!
//! # Example
//!
//! ```ignore
//! use stagehand::chain::{ChainBackend, JsonRpcChain};
//! use stagehand::core::types::Address;
//!
//! let chain = JsonRpcChain::new(
//!     "http://127.0.0.1:8545",
//!     Address::from_hex("0x5409ed021d9299bf6814279a6a1411a7e866a631")?,
//!     Address::from_hex("0x000000000000000000000000000000000000ce10")?,
//! );
//! let registry = chain.registry_address_for(&name).await?;
//! ```

use async_trait::async_trait;
use ethers_core::abi::Token;
use ethers_core::types::{H160, U256};
use ethers_core::utils::get_contract_address;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::traits::{ChainBackend, ChainError, DeployRequest};
use crate::core::types::{Address, UnitName};

/// Registry lookup function the directory contract exposes.
const REGISTRY_LOOKUP_SIGNATURE: &str = "getAddressForString(string)";

/// JSON-RPC chain backend.
///
/// Holds the node endpoint, the unlocked sender account, and the address
/// of the on-chain registry directory. One instance serves a whole run;
/// nonces are fetched per deployment, never cached.
#[derive(Debug, Clone)]
pub struct JsonRpcChain {
    /// HTTP client for making requests
    client: Client,
    /// Node endpoint URL
    url: String,
    /// Unlocked sender account on the node
    from: Address,
    /// On-chain registry directory contract
    registry: Address,
}

impl JsonRpcChain {
    /// Create a backend against a node endpoint.
    ///
    /// `from` must be unlocked on the node; `registry` is the directory
    /// contract that answers name lookups.
    pub fn new(url: impl Into<String>, from: Address, registry: Address) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            from,
            registry,
        }
    }

    /// The configured sender account.
    pub fn sender(&self) -> Address {
        self.from
    }

    /// Issue one JSON-RPC request and unwrap its result.
    async fn rpc<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::Network(e.to_string()))?;

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        body.result.ok_or_else(|| {
            ChainError::InvalidResponse(format!("{method} returned neither result nor error"))
        })
    }

    /// The sender's pending nonce.
    async fn pending_nonce(&self) -> Result<U256, ChainError> {
        let raw: String = self
            .rpc(
                "eth_getTransactionCount",
                json!([self.from.to_hex(), "pending"]),
            )
            .await?;
        parse_quantity(&raw)
    }
}

#[async_trait]
impl ChainBackend for JsonRpcChain {
    fn name(&self) -> &'static str {
        "json-rpc"
    }

    async fn deploy_contract(&self, request: DeployRequest) -> Result<Address, ChainError> {
        // The address a creation tx lands at is a pure function of the
        // sender and its nonce, so read the nonce before sending.
        let nonce = self.pending_nonce().await?;

        let _tx_hash: String = self
            .rpc(
                "eth_sendTransaction",
                json!([{
                    "from": self.from.to_hex(),
                    "data": request.bytecode,
                }]),
            )
            .await?;

        Ok(Address::from(get_contract_address(self.from.h160(), nonce)))
    }

    async fn send(
        &self,
        to: Address,
        data: Vec<u8>,
        _description: &str,
    ) -> Result<(), ChainError> {
        let _tx_hash: String = self
            .rpc(
                "eth_sendTransaction",
                json!([{
                    "from": self.from.to_hex(),
                    "to": to.to_hex(),
                    "data": format!("0x{}", hex::encode(&data)),
                }]),
            )
            .await?;
        Ok(())
    }

    async fn registry_address_for(&self, name: &UnitName) -> Result<Address, ChainError> {
        let data = registry_lookup_call(name);
        let raw: String = self
            .rpc(
                "eth_call",
                json!([
                    {
                        "to": self.registry.to_hex(),
                        "data": format!("0x{}", hex::encode(&data)),
                    },
                    "latest",
                ]),
            )
            .await?;
        decode_address_word(&raw)
    }
}

/// Full calldata for a registry name lookup.
fn registry_lookup_call(name: &UnitName) -> Vec<u8> {
    let selector = ethers_core::utils::id(REGISTRY_LOOKUP_SIGNATURE);
    let encoded = ethers_core::abi::encode(&[Token::String(name.as_str().to_string())]);
    let mut data = Vec::with_capacity(4 + encoded.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&encoded);
    data
}

/// Parse a JSON-RPC hex quantity (`0x`-prefixed, no padding guarantees).
fn parse_quantity(raw: &str) -> Result<U256, ChainError> {
    let digits = raw.strip_prefix("0x").ok_or_else(|| {
        ChainError::InvalidResponse(format!("quantity '{raw}' is missing its 0x prefix"))
    })?;
    U256::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("quantity '{raw}': {e}")))
}

/// Decode the single ABI-encoded address word an `eth_call` returns.
fn decode_address_word(raw: &str) -> Result<Address, ChainError> {
    let digits = raw.strip_prefix("0x").ok_or_else(|| {
        ChainError::InvalidResponse(format!("call result '{raw}' is missing its 0x prefix"))
    })?;
    let bytes = hex::decode(digits)
        .map_err(|e| ChainError::InvalidResponse(format!("call result is not hex: {e}")))?;
    if bytes.len() != 32 {
        return Err(ChainError::InvalidResponse(format!(
            "expected a 32-byte word, got {} byte(s)",
            bytes.len()
        )));
    }
    // An address word is zero-padded on the left; the low 20 bytes carry it.
    Ok(Address::from(H160::from_slice(&bytes[12..])))
}

// ---- JSON-RPC Wire Types ----

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct RpcResponse<T> {
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(hex40: &str) -> Address {
        Address::from_hex(&format!("0x{hex40}")).unwrap()
    }

    mod quantities {
        use super::*;

        #[test]
        fn parses_short_and_padded() {
            assert_eq!(parse_quantity("0x0").unwrap(), U256::zero());
            assert_eq!(parse_quantity("0x10").unwrap(), U256::from(16u64));
            assert_eq!(parse_quantity("0x000000ff").unwrap(), U256::from(255u64));
        }

        #[test]
        fn rejects_unprefixed_and_junk() {
            assert!(parse_quantity("10").is_err());
            assert!(parse_quantity("0xzz").is_err());
        }
    }

    mod address_words {
        use super::*;

        #[test]
        fn decodes_right_aligned_address() {
            let word = format!(
                "0x{}{}",
                "0".repeat(24),
                "5409ed021d9299bf6814279a6a1411a7e866a631"
            );
            let decoded = decode_address_word(&word).unwrap();
            assert_eq!(decoded, addr("5409ed021d9299bf6814279a6a1411a7e866a631"));
        }

        #[test]
        fn decodes_zero_word_as_zero_address() {
            let word = format!("0x{}", "0".repeat(64));
            assert!(decode_address_word(&word).unwrap().is_zero());
        }

        #[test]
        fn rejects_wrong_width() {
            assert!(decode_address_word("0x").is_err());
            assert!(decode_address_word("0xce10").is_err());
            let too_long = format!("0x{}", "0".repeat(66));
            assert!(decode_address_word(&too_long).is_err());
        }

        #[test]
        fn rejects_unprefixed() {
            assert!(decode_address_word(&"0".repeat(64)).is_err());
        }
    }

    mod lookup_calldata {
        use super::*;
        use crate::core::types::UnitName;

        #[test]
        fn selector_then_encoded_string() {
            let name = UnitName::new("Exchange").unwrap();
            let data = registry_lookup_call(&name);

            let selector = ethers_core::utils::id(REGISTRY_LOOKUP_SIGNATURE);
            assert_eq!(&data[..4], &selector);

            // offset word + length word + one padded data word
            assert_eq!(data.len(), 4 + 32 * 3);
            assert_eq!(&data[4 + 64..4 + 64 + 8], b"Exchange");
        }
    }
}
