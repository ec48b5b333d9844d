pub mod render;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use std::str::FromStr;
use std::sync::Arc;

use crate::balance::{BalanceBook, BalanceObservation, Holder};
use crate::market::{MarketState, PriceSnapshot, SupplyStat};
use crate::token::Token;
use crate::valuation::{DerivedMetrics, StableSource, ValuationInputs};

/// The two dashboard flavours share one core and differ in where the USDC
/// backing PESO is read from and in section order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Backs PESO with the USDC held by the PESO contract itself.
    #[default]
    Reserves,
    /// Skips the reserve lookup; only the treasury's USDC backs PESO.
    Treasury,
}

impl Variant {
    pub fn stable_sources(&self) -> &'static [StableSource] {
        match self {
            Variant::Reserves => &[StableSource::PegReserves],
            Variant::Treasury => &[StableSource::Treasury],
        }
    }

    pub fn fetches_reserves(&self) -> bool {
        self.stable_sources().contains(&StableSource::PegReserves)
    }
}

impl FromStr for Variant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reserves" => Ok(Variant::Reserves),
            "treasury" => Ok(Variant::Treasury),
            other => Err(anyhow!(
                "Unknown dashboard variant {:?}, expected \"reserves\" or \"treasury\"",
                other
            )),
        }
    }
}

/// Everything one render needs, read at a single point in time.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub variant: Variant,
    pub wallet_address: Option<String>,
    pub treasury_address: String,
    pub user: Vec<(Token, BalanceObservation)>,
    pub treasury: Vec<(Token, BalanceObservation)>,
    pub prices: PriceSnapshot,
    pub supply: SupplyStat,
    pub metrics: DerivedMetrics,
}

pub struct Dashboard {
    variant: Variant,
    treasury_address: String,
    balances: Arc<BalanceBook>,
    market: MarketState,
}

impl Dashboard {
    pub fn new(
        variant: Variant,
        treasury_address: impl Into<String>,
        balances: Arc<BalanceBook>,
        market: MarketState,
    ) -> Self {
        Self {
            variant,
            treasury_address: treasury_address.into(),
            balances,
            market,
        }
    }

    /// Read the latest inputs and derive metrics from scratch.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        let user = self.balances.holdings(Holder::User).await;
        let treasury = self.balances.holdings(Holder::Treasury).await;
        let prices = self.market.prices().await;
        let supply = self.market.supply().await;

        let metrics = DerivedMetrics::compute(
            &ValuationInputs {
                treasury: &treasury,
                prices,
                supply,
            },
            self.variant.stable_sources(),
        );

        DashboardSnapshot {
            variant: self.variant,
            wallet_address: self.balances.session().address().map(|a| a.to_string()),
            treasury_address: self.treasury_address.clone(),
            user,
            treasury,
            prices,
            supply,
            metrics,
        }
    }

    pub async fn render(&self) -> String {
        render::render(&self.snapshot().await)
    }
}
