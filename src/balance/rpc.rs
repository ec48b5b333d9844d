use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bigdecimal::num_bigint::{BigInt, Sign};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use super::BalanceProvider;
use crate::token::structs::{TokenAmount, TokenInfo};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// `balanceOf(address)`
const BALANCE_OF_SELECTOR: &str = "70a08231";
/// `decimals()`
const DECIMALS_SELECTOR: &str = "313ce567";

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Reads ERC-20 balances with plain `eth_call`s against a JSON-RPC node.
///
/// Token decimals never change, so each token's `decimals()` is read once and
/// cached by contract address.
pub struct RpcBalanceProvider {
    client: Client,
    rpc_url: String,
    decimals: RwLock<HashMap<String, u8>>,
}

impl RpcBalanceProvider {
    pub fn new(rpc_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .context("Failed to build RPC client")?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            decimals: RwLock::new(HashMap::new()),
        })
    }

    async fn request(&self, method: &str, params: Value) -> Result<String> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: RpcResponse = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            anyhow::bail!("{} failed ({}): {}", method, error.code, error.message);
        }
        response
            .result
            .ok_or(anyhow::anyhow!("{} returned no result", method))
    }

    async fn eth_call(&self, to: &str, data: String) -> Result<U256> {
        let result = self
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        parse_quantity(&result)
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let result = self.request("eth_chainId", json!([])).await?;
        u64::try_from(parse_quantity(&result)?).map_err(|_| anyhow::anyhow!("Chain id out of range"))
    }

    async fn cached_decimals(&self, address: &str) -> Option<u8> {
        self.decimals
            .read()
            .await
            .get(&address.to_ascii_lowercase())
            .copied()
    }

    async fn remember_decimals(&self, address: &str, decimals: u8) {
        self.decimals
            .write()
            .await
            .insert(address.to_ascii_lowercase(), decimals);
    }

    async fn token_decimals(&self, token: &TokenInfo) -> Result<u8> {
        if let Some(decimals) = self.cached_decimals(&token.address).await {
            return Ok(decimals);
        }

        let raw = self
            .eth_call(&token.address, format!("0x{DECIMALS_SELECTOR}"))
            .await?;
        let decimals = u8::try_from(raw)
            .map_err(|_| anyhow::anyhow!("{} reported invalid decimals", token.token))?;
        if decimals != token.decimals {
            tracing::warn!(
                "{} reports {} decimals, configured {}",
                token.token,
                decimals,
                token.decimals
            );
        }

        self.remember_decimals(&token.address, decimals).await;
        Ok(decimals)
    }
}

#[async_trait]
impl BalanceProvider for RpcBalanceProvider {
    async fn get_balance(&self, owner: &str, token: &TokenInfo) -> Result<TokenAmount> {
        let balance_call = balance_of_calldata(owner)?;

        let (raw, decimals) = tokio::try_join!(
            self.eth_call(&token.address, balance_call),
            self.token_decimals(token),
        )
        .with_context(|| format!("balanceOf {} on {}", owner, token.token))?;

        Ok(TokenAmount::new(owner, token.token, to_bigint(raw), decimals))
    }
}

fn balance_of_calldata(owner: &str) -> Result<String> {
    let owner = Address::from_str(owner)
        .with_context(|| format!("Owner {} is not a 20 byte address", owner))?;

    Ok(format!(
        "0x{}{}",
        BALANCE_OF_SELECTOR,
        hex::encode(owner.into_word())
    ))
}

/// Parse a hex quantity or 32-byte word returned by the node.
fn parse_quantity(value: &str) -> Result<U256> {
    let digits = value.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(digits, 16).with_context(|| format!("Invalid hex quantity: {}", value))
}

fn to_bigint(value: U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}
