pub mod basescan;
pub mod dexscreener;
pub mod poller;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use std::sync::Arc;

use crate::constant::*;
use crate::token::Token;

/// USD unit prices. All three priced tokens are always present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceSnapshot {
    pub kartel: f64,
    pub usdc: f64,
    pub peso: f64,
}

impl Default for PriceSnapshot {
    fn default() -> Self {
        Self {
            kartel: 0.0,
            usdc: USDC_PRICE_USD,
            peso: PESO_PRICE_USD,
        }
    }
}

impl PriceSnapshot {
    #[cfg(test)]
    pub fn with_kartel(kartel: f64) -> Self {
        Self {
            kartel,
            ..Self::default()
        }
    }

    pub fn price(&self, token: Token) -> f64 {
        match token {
            Token::Kartel => self.kartel,
            Token::Usdc => self.usdc,
            Token::Peso => self.peso,
            Token::Lp => 0.0,
        }
    }
}

/// Explorer figures, zero until the first successful fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SupplyStat {
    /// PESO circulating supply in whole tokens.
    pub peso_circulating: f64,
    /// USDC held by the PESO contract in whole tokens.
    pub usdc_reserves: f64,
}

/// Source of the KARTEL USD price.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch_price(&self) -> Result<f64>;
}

/// Source of PESO supply and the USDC reserves backing it.
#[async_trait]
pub trait SupplySource: Send + Sync {
    async fn circulating_supply(&self) -> Result<f64>;
    async fn stable_reserves(&self) -> Result<f64>;
}

#[derive(Debug, Default)]
struct MarketInner {
    prices: PriceSnapshot,
    supply: SupplyStat,
    stopped: bool,
}

/// Single-writer market data shared between the poller and readers.
///
/// Once stopped, every setter is a no-op and reports `false`.
#[derive(Debug, Clone, Default)]
pub struct MarketState {
    inner: Arc<RwLock<MarketInner>>,
}

impl MarketState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn prices(&self) -> PriceSnapshot {
        self.inner.read().await.prices
    }

    pub async fn supply(&self) -> SupplyStat {
        self.inner.read().await.supply
    }

    pub async fn set_kartel_price(&self, price: f64) -> bool {
        let mut inner = self.inner.write().await;
        if inner.stopped {
            return false;
        }
        inner.prices.kartel = price;
        true
    }

    pub async fn set_circulating_supply(&self, supply: f64) -> bool {
        let mut inner = self.inner.write().await;
        if inner.stopped {
            return false;
        }
        inner.supply.peso_circulating = supply;
        true
    }

    pub async fn set_stable_reserves(&self, reserves: f64) -> bool {
        let mut inner = self.inner.write().await;
        if inner.stopped {
            return false;
        }
        inner.supply.usdc_reserves = reserves;
        true
    }

    pub(crate) async fn stop(&self) {
        self.inner.write().await.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prices() {
        let prices = PriceSnapshot::default();

        assert_eq!(prices.price(Token::Kartel), 0.0);
        assert_eq!(prices.price(Token::Usdc), 1.0);
        assert_eq!(prices.price(Token::Peso), 0.05);
        assert_eq!(prices.price(Token::Lp), 0.0);
    }

    #[tokio::test]
    async fn test_stopped_state_rejects_writes() {
        let state = MarketState::new();
        assert!(state.set_kartel_price(0.002).await);
        assert!(state.set_circulating_supply(2000.0).await);

        state.stop().await;

        assert!(!state.set_kartel_price(1.0).await);
        assert!(!state.set_circulating_supply(1.0).await);
        assert!(!state.set_stable_reserves(1.0).await);
        assert_eq!(state.prices().await.kartel, 0.002);
        assert_eq!(state.supply().await.peso_circulating, 2000.0);
        assert_eq!(state.supply().await.usdc_reserves, 0.0);
    }
}
