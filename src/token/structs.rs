/// # Token Amounts
///
/// ERC-20 balances are `uint256` on chain, so raw amounts are kept as `BigInt`
/// and only turned into `f64` for display and valuation. The decimal string in
/// `formatted` is exact; `ui_amount` is the lossy view used for arithmetic.
use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};

use super::Token;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token: Token,
    pub address: String,
    pub decimals: u8,
}

impl std::fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TokenInfo {{ symbol: {}, address: {}, decimals: {} }}",
            self.token, self.address, self.decimals
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenAmount {
    pub owner: String,
    pub token: Token,
    pub raw_amount: BigInt, // e.g. 1000000000000000000
    pub decimals: u8,       // e.g. 18
    pub ui_amount: f64,     // e.g. 1.0
}

impl TokenAmount {
    pub fn new(owner: impl Into<String>, token: Token, raw_amount: BigInt, decimals: u8) -> Self {
        let ui_amount = to_ui_amount(&raw_amount, decimals);
        Self {
            owner: owner.into(),
            token,
            raw_amount,
            decimals,
            ui_amount,
        }
    }

    /// Exact decimal rendering of `raw_amount / 10^decimals`, trailing zeros trimmed.
    pub fn formatted(&self) -> String {
        format_units(&self.raw_amount, self.decimals)
    }
}

pub fn to_ui_amount(raw: &BigInt, decimals: u8) -> f64 {
    BigDecimal::new(raw.clone(), decimals as i64)
        .to_f64()
        .unwrap_or(f64::NAN)
}

pub fn format_units(raw: &BigInt, decimals: u8) -> String {
    let negative = raw.sign() == bigdecimal::num_bigint::Sign::Minus;
    let digits = raw.magnitude().to_string();
    let decimals = decimals as usize;

    let (whole, fraction) = if digits.len() > decimals {
        let (w, f) = digits.split_at(digits.len() - decimals);
        (w.to_string(), f.to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    let fraction = fraction.trim_end_matches('0');
    let sign = if negative { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{whole}")
    } else {
        format!("{sign}{whole}.{fraction}")
    }
}
