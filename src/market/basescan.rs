use anyhow::{Context, Result};
use async_trait::async_trait;
use bigdecimal::num_bigint::BigInt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use std::time::Duration;

use super::SupplySource;
use crate::config::Config;
use crate::token::structs::{to_ui_amount, TokenInfo};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct ExplorerResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub result: Value,
}

/// BaseScan explorer API, used for PESO supply and the USDC held by PESO.
pub struct BaseScanClient {
    client: Client,
    api_url: String,
    api_key: String,
    peso: TokenInfo,
    usdc: TokenInfo,
}

impl BaseScanClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .context("Failed to build BaseScan client")?;

        Ok(Self {
            client,
            api_url: config.basescan_api_url.clone(),
            api_key: config.basescan_api_key.clone(),
            peso: config.peso.clone(),
            usdc: config.usdc.clone(),
        })
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<BigInt> {
        let response = self
            .client
            .get(&self.api_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<ExplorerResponse>()
            .await?;

        parse_result(&response)
    }

    /// Total supply of `contract` in its smallest unit.
    pub async fn token_supply(&self, contract: &str) -> Result<BigInt> {
        self.query(&[
            ("module", "stats"),
            ("action", "tokensupply"),
            ("contractaddress", contract),
        ])
        .await
        .with_context(|| format!("tokensupply of {}", contract))
    }

    /// Balance of `contract` tokens held by `address`, in the smallest unit.
    pub async fn token_balance(&self, contract: &str, address: &str) -> Result<BigInt> {
        self.query(&[
            ("module", "account"),
            ("action", "tokenbalance"),
            ("contractaddress", contract),
            ("address", address),
            ("tag", "latest"),
        ])
        .await
        .with_context(|| format!("tokenbalance of {} at {}", contract, address))
    }
}

#[async_trait]
impl SupplySource for BaseScanClient {
    async fn circulating_supply(&self) -> Result<f64> {
        let raw = self.token_supply(&self.peso.address).await?;
        Ok(to_ui_amount(&raw, self.peso.decimals))
    }

    async fn stable_reserves(&self) -> Result<f64> {
        let raw = self
            .token_balance(&self.usdc.address, &self.peso.address)
            .await?;
        Ok(to_ui_amount(&raw, self.usdc.decimals))
    }
}

/// The explorer answers errors with HTTP 200 and a text `result`, so anything
/// that is not a decimal integer string is rejected.
pub fn parse_result(response: &ExplorerResponse) -> Result<BigInt> {
    let reject = || {
        anyhow::anyhow!(
            "Explorer error (status {}, {}): {}",
            response.status.as_deref().unwrap_or("?"),
            response.message.as_deref().unwrap_or("no message"),
            response.result
        )
    };

    let digits = response.result.as_str().ok_or_else(reject)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(reject());
    }

    digits.parse::<BigInt>().map_err(|_| reject())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<BigInt> {
        let response: ExplorerResponse = serde_json::from_str(json).unwrap();
        parse_result(&response)
    }

    #[test]
    fn test_parse_result() {
        let raw = parse(r#"{"status":"1","message":"OK","result":"2000000000000000000000"}"#).unwrap();
        assert_eq!(to_ui_amount(&raw, 18), 2000.0);

        let raw = parse(r#"{"status":"1","message":"OK","result":"100000000"}"#).unwrap();
        assert_eq!(to_ui_amount(&raw, 6), 100.0);
    }

    #[test]
    fn test_parse_result_rejects_errors() {
        assert!(parse(r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#).is_err());
        assert!(parse(r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#).is_err());
        assert!(parse(r#"{"status":"1","message":"OK","result":""}"#).is_err());
        assert!(parse(r#"{"status":"1","message":"OK","result":null}"#).is_err());
        assert!(parse(r#"{"status":"1","message":"OK","result":-5}"#).is_err());
    }
}
