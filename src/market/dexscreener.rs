use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use std::time::Duration;

use super::PriceFeed;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);
const CHAIN_SLUG: &str = "base";

#[derive(Debug, Deserialize)]
pub struct PairResponse {
    pub pair: Option<Pair>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    pub price_usd: Option<String>,
}

/// KARTEL price from the DexScreener pair endpoint.
pub struct DexScreenerFeed {
    client: Client,
    url: String,
}

impl DexScreenerFeed {
    pub fn new(api_url: &str, pair: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .context("Failed to build DexScreener client")?;
        let url = format!(
            "{}/latest/dex/pairs/{}/{}",
            api_url.trim_end_matches('/'),
            CHAIN_SLUG,
            pair
        );

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PriceFeed for DexScreenerFeed {
    async fn fetch_price(&self) -> Result<f64> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<PairResponse>()
            .await?;

        pair_price(&response)
    }
}

/// Extract a usable USD price; a missing pair or a non-numeric price is an error.
pub fn pair_price(response: &PairResponse) -> Result<f64> {
    let raw = response
        .pair
        .as_ref()
        .and_then(|pair| pair.price_usd.as_deref())
        .ok_or(anyhow::anyhow!("Pair has no USD price"))?;

    let price = raw
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid USD price {:?}", raw))?;
    if !price.is_finite() || price < 0.0 {
        anyhow::bail!("Invalid USD price {}", price);
    }

    Ok(price)
}
