use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use std::str::FromStr;
use std::time::Duration;

use crate::constant::*;
use crate::dashboard::Variant;
use crate::token::structs::TokenInfo;
use crate::token::Token;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    // Network configuration
    pub chain_id: u64,
    pub rpc_url: String,

    // Fixed addresses
    pub kartel: TokenInfo,
    pub usdc: TokenInfo,
    pub peso: TokenInfo,
    pub lp: TokenInfo,
    pub treasury: String,

    // Price feed configuration
    pub dexscreener_api_url: String,
    pub kartel_pair: String,

    // Explorer configuration
    pub basescan_api_url: String,
    pub basescan_api_key: String,

    // Connected wallet, if any
    pub wallet_address: Option<String>,

    // Dashboard
    pub variant: Variant,
    pub poll_interval: Duration,
    pub balance_refresh_interval: Duration,
    pub render_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chain_id: BASE_CHAIN_ID,
            rpc_url: BASE_RPC_URL.into(),
            kartel: token_info(Token::Kartel, KARTEL),
            usdc: token_info(Token::Usdc, USDC),
            peso: token_info(Token::Peso, PESO),
            lp: token_info(Token::Lp, KARTEL_PESO_LP),
            treasury: TREASURY.into(),
            dexscreener_api_url: DEXSCREENER_API_URL.into(),
            kartel_pair: KARTEL_PAIR.into(),
            basescan_api_url: BASESCAN_API_URL.into(),
            basescan_api_key: String::new(),
            wallet_address: None,
            variant: Variant::default(),
            poll_interval: POLL_INTERVAL,
            balance_refresh_interval: BALANCE_REFRESH_INTERVAL,
            render_interval: RENDER_INTERVAL,
        }
    }
}

impl Config {
    /// Build the configuration from the process environment.
    ///
    /// Contract addresses and the chain id are fixed; only endpoints, the
    /// explorer key, the connected wallet and timings can be overridden.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(url) = std::env::var("BASE_RPC_URL") {
            config.rpc_url = url;
        }
        if let Ok(url) = std::env::var("DEXSCREENER_API_URL") {
            config.dexscreener_api_url = url;
        }
        if let Ok(pair) = std::env::var("KARTEL_PAIR") {
            config.kartel_pair = pair;
        }
        if let Ok(url) = std::env::var("BASESCAN_API_URL") {
            config.basescan_api_url = url;
        }

        config.basescan_api_key = std::env::var("BASESCAN_API_KEY").unwrap_or_default();
        if config.basescan_api_key.is_empty() {
            tracing::warn!("BASESCAN_API_KEY is not set, explorer requests will be rate limited");
        }

        config.wallet_address = std::env::var("WALLET_ADDRESS")
            .ok()
            .map(|address| address.trim().to_string())
            .filter(|address| !address.is_empty());

        if let Ok(variant) = std::env::var("DASHBOARD_VARIANT") {
            config.variant = Variant::from_str(&variant)?;
        }

        config.poll_interval = env_secs("POLL_INTERVAL_SECS", config.poll_interval)?;
        config.balance_refresh_interval =
            env_secs("BALANCE_REFRESH_SECS", config.balance_refresh_interval)?;
        config.render_interval = env_secs("RENDER_INTERVAL_SECS", config.render_interval)?;

        Ok(config)
    }

    pub fn token(&self, token: Token) -> &TokenInfo {
        match token {
            Token::Kartel => &self.kartel,
            Token::Usdc => &self.usdc,
            Token::Peso => &self.peso,
            Token::Lp => &self.lp,
        }
    }
}

fn token_info(token: Token, address: &str) -> TokenInfo {
    TokenInfo {
        token,
        address: address.into(),
        decimals: token.known_decimals(),
    }
}

fn env_secs(key: &str, default: Duration) -> Result<Duration> {
    match std::env::var(key) {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .with_context(|| format!("{key} must be a whole number of seconds"))?;
            if secs == 0 {
                anyhow::bail!("{key} must be greater than zero");
            }
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(default),
    }
}
