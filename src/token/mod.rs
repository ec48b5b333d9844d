pub mod structs;

use serde::{Deserialize, Serialize};

use crate::constant::*;

/// The four tokens the dashboard knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Token {
    /// Primary token, market priced.
    Kartel,
    /// Stable token, priced at 1 USD.
    Usdc,
    /// Pegged token, priced at 0.05 USD by policy.
    Peso,
    /// KARTEL/PESO liquidity token, unpriced.
    Lp,
}

impl Token {
    pub const ALL: [Token; 4] = [Token::Kartel, Token::Usdc, Token::Peso, Token::Lp];

    pub fn symbol(&self) -> &'static str {
        match self {
            Token::Kartel => "KARTEL",
            Token::Usdc => "USDC",
            Token::Peso => "PESO",
            Token::Lp => "KARTEL/PESO LP",
        }
    }

    /// Decimals used when the explorer hands back raw integers for this token.
    pub fn known_decimals(&self) -> u8 {
        match self {
            Token::Usdc => USDC_DECIMALS,
            Token::Kartel | Token::Peso | Token::Lp => PESO_DECIMALS,
        }
    }

    /// Whether the token carries a USD price at all.
    pub fn is_priced(&self) -> bool {
        !matches!(self, Token::Lp)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
