//! Derived dashboard figures.
//!
//! Everything here is a pure function of the latest balances, prices and
//! explorer figures. Nothing is cached; callers recompute on every render.

use serde::{Deserialize, Serialize};

use crate::balance::BalanceObservation;
use crate::constant::PESO_PRICE_USD;
use crate::market::{PriceSnapshot, SupplyStat};
use crate::token::Token;

/// Where a USDC figure counted towards PESO backing comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StableSource {
    /// USDC held by the PESO contract, as reported by the explorer.
    PegReserves,
    /// USDC balance of the treasury address.
    Treasury,
}

/// USD value of `amount` tokens. Amounts that are not numbers count as zero.
pub fn usd_value(amount: f64, price: f64) -> f64 {
    if amount.is_nan() || price.is_nan() {
        return 0.0;
    }
    amount * price
}

/// Numeric value of an observation, `fallback` unless it resolved to a number.
pub fn resolve_or_default(observation: &BalanceObservation, fallback: f64) -> f64 {
    match observation {
        BalanceObservation::Resolved(amount) if !amount.ui_amount.is_nan() => amount.ui_amount,
        _ => fallback,
    }
}

/// Amount of `token` in a holder's observations, zero when absent.
pub fn holding(holdings: &[(Token, BalanceObservation)], token: Token) -> f64 {
    holdings
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, observation)| resolve_or_default(observation, 0.0))
        .unwrap_or(0.0)
}

/// Sum of `balance * price` over every priced treasury token.
///
/// PESO is always valued at its peg, whatever the snapshot says.
pub fn treasury_total_value(holdings: &[(Token, BalanceObservation)], prices: &PriceSnapshot) -> f64 {
    holdings
        .iter()
        .filter(|(token, _)| token.is_priced())
        .map(|(token, observation)| {
            let price = match token {
                Token::Peso => PESO_PRICE_USD,
                other => prices.price(*other),
            };
            usd_value(resolve_or_default(observation, 0.0), price)
        })
        .sum()
}

/// Backing ratio as a percentage of the pegged value of circulating PESO.
///
/// `None` when there is no circulating supply to divide by. Tiny supplies are
/// not clamped.
pub fn backing_ratio(stable_reserves: f64, circulating_supply: f64) -> Option<f64> {
    if !(circulating_supply > 0.0) {
        return None;
    }
    Some(stable_reserves / (circulating_supply * PESO_PRICE_USD) * 100.0)
}

/// Everything the dashboard derives for one render.
pub struct ValuationInputs<'a> {
    pub treasury: &'a [(Token, BalanceObservation)],
    pub prices: PriceSnapshot,
    pub supply: SupplyStat,
}

pub fn combined_stable_balance(inputs: &ValuationInputs, sources: &[StableSource]) -> f64 {
    sources
        .iter()
        .map(|source| match source {
            StableSource::PegReserves => inputs.supply.usdc_reserves,
            StableSource::Treasury => holding(inputs.treasury, Token::Usdc),
        })
        .filter(|value| !value.is_nan())
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub combined_stable_balance: f64,
    pub treasury_total_value: f64,
    pub backing_ratio: Option<f64>,
}

impl DerivedMetrics {
    pub fn compute(inputs: &ValuationInputs, sources: &[StableSource]) -> Self {
        let combined_stable_balance = combined_stable_balance(inputs, sources);

        Self {
            combined_stable_balance,
            treasury_total_value: treasury_total_value(inputs.treasury, &inputs.prices),
            backing_ratio: backing_ratio(combined_stable_balance, inputs.supply.peso_circulating),
        }
    }
}
