//! Minimal JSON-RPC client for read-only contract calls.
//!
//! Reserves, pool state and reference prices are all view calls, so
//! `eth_call` is the workhorse; `eth_blockNumber` is only used to pin a
//! `latest` client to one block. Calldata is built with `alloy::sol!`
//! bindings and the returned bytes are decoded with the same bindings.

use std::time::Duration;

use alloy::hex;
use alloy::primitives::Address;
use alloy::sol_types::SolCall;
use eyre::{eyre, Context, Result};
use reqwest::Client;
use serde::Deserialize;

/// Block at which calls are evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockTag {
    #[default]
    Latest,
    Number(u64),
}

impl BlockTag {
    /// JSON-RPC encoding of the tag.
    pub fn as_param(&self) -> String {
        match self {
            Self::Latest => "latest".to_string(),
            Self::Number(number) => format!("0x{number:x}"),
        }
    }
}

impl From<Option<u64>> for BlockTag {
    fn from(block: Option<u64>) -> Self {
        block.map_or(Self::Latest, Self::Number)
    }
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC endpoint pinned to one block.
#[derive(Clone, Debug)]
pub struct RpcClient {
    client: Client,
    url: String,
    block: BlockTag,
}

impl RpcClient {
    /// Creates a client for `url`, evaluating calls at `block`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(url: &str, block: BlockTag) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .wrap_err("failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
            block,
        })
    }

    /// Block tag calls are evaluated at.
    pub fn block(&self) -> BlockTag {
        self.block
    }

    /// Current head block number, from `eth_blockNumber`.
    ///
    /// # Errors
    /// Returns error if the request fails or the result is not a hex quantity.
    pub async fn block_number(&self) -> Result<u64> {
        let result = self.request("eth_blockNumber", serde_json::json!([])).await?;
        parse_quantity(&result).wrap_err("eth_blockNumber returned an invalid quantity")
    }

    /// Resolves [`BlockTag::Latest`] to the current head block, so every call
    /// made through this client (and its clones) reads the same chain state.
    /// A client already at a block number is returned unchanged without a
    /// request.
    ///
    /// # Errors
    /// Returns error if the head block cannot be read.
    pub async fn pinned(mut self) -> Result<Self> {
        if self.block == BlockTag::Latest {
            let number = self.block_number().await?;
            tracing::debug!(block = number, "pinned latest block");
            self.block = BlockTag::Number(number);
        }
        Ok(self)
    }

    async fn request(&self, method: &str, params: serde_json::Value) -> Result<String> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| eyre!("{} request failed: {}", method, e))?;

        let status = response.status();
        let rpc: RpcResponse<String> = response
            .json()
            .await
            .map_err(|e| eyre!("failed to decode {} response: {}", method, e))?;

        if !status.is_success() {
            return Err(eyre!("{} HTTP status: {}", method, status));
        }

        if let Some(error) = rpc.error {
            return Err(eyre!(
                "{} RPC error {}: {}",
                method,
                error.code,
                error.message
            ));
        }

        rpc.result.ok_or_else(|| eyre!("{} missing result", method))
    }

    /// Raw `eth_call` returning the undecoded output bytes.
    ///
    /// # Errors
    /// Returns error if the request fails, the call reverts, or the result is not hex.
    #[tracing::instrument(skip(self, data), fields(block = %self.block.as_param()))]
    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        let params = serde_json::json!([
            {
                "to": format!("{to:#x}"),
                "data": format!("0x{}", hex::encode(data)),
            },
            self.block.as_param()
        ]);

        let result_hex = self.request("eth_call", params).await?;
        hex::decode(result_hex.trim_start_matches("0x"))
            .map_err(|e| eyre!("eth_call to {to:#x} returned invalid hex: {e}"))
    }

    /// ABI-encodes `call`, sends it to `to` and decodes the return values.
    ///
    /// # Errors
    /// Returns error if the call fails or the output does not decode.
    pub async fn call<C: SolCall>(&self, to: Address, call: &C) -> Result<C::Return> {
        let output = self.eth_call(to, &call.abi_encode()).await?;
        if output.is_empty() {
            return Err(eyre!("{} on {to:#x} returned no data", C::SIGNATURE));
        }

        C::abi_decode_returns(&output, true)
            .wrap_err_with(|| format!("failed to decode {} output from {to:#x}", C::SIGNATURE))
    }
}

fn parse_quantity(value: &str) -> Result<u64> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| eyre!("quantity {value:?} lacks the 0x prefix"))?;
    u64::from_str_radix(digits, 16).map_err(|e| eyre!("quantity {value:?} is not hex: {e}"))
}
