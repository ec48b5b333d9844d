use std::fmt::Write;

use super::{DashboardSnapshot, Variant};
use crate::balance::BalanceObservation;
use crate::constant::{PESO_PRICE_USD, PLACEHOLDER, USDC_PRICE_USD};
use crate::market::PriceSnapshot;
use crate::token::Token;
use crate::valuation::usd_value;

pub fn render(snapshot: &DashboardSnapshot) -> String {
    let sections = match snapshot.variant {
        Variant::Reserves => vec![
            balances_section(snapshot),
            minting_section(),
            treasury_section(snapshot),
            statistics_section(snapshot),
        ],
        Variant::Treasury => vec![
            treasury_section(snapshot),
            statistics_section(snapshot),
            balances_section(snapshot),
        ],
    };

    sections.join("\n")
}

fn balances_section(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::from("BALANCES\n");
    match &snapshot.wallet_address {
        Some(address) => {
            let _ = writeln!(out, "{}", address);
            for (token, observation) in &snapshot.user {
                let _ = writeln!(out, "{}", balance_line(*token, observation, &snapshot.prices));
            }
        }
        None => out.push_str("Connect a wallet to see balances\n"),
    }
    out
}

fn minting_section() -> String {
    format!(
        "MINTING {} PESO per 1 USDC\n",
        (USDC_PRICE_USD / PESO_PRICE_USD).round()
    )
}

fn treasury_section(snapshot: &DashboardSnapshot) -> String {
    let mut out = format!("TREASURY {}\n", snapshot.treasury_address);
    for (token, observation) in &snapshot.treasury {
        let _ = writeln!(out, "{}", balance_line(*token, observation, &snapshot.prices));
    }
    out
}

fn statistics_section(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::from("STATISTICS\n");
    let _ = writeln!(
        out,
        "PESO Circulating Supply: {}",
        format_number(snapshot.supply.peso_circulating)
    );
    match snapshot.variant {
        Variant::Reserves => {
            let _ = writeln!(
                out,
                "USDC Reserves: ${}",
                format_number(snapshot.supply.usdc_reserves)
            );
        }
        Variant::Treasury => {
            let _ = writeln!(
                out,
                "USDC Backing: ${}",
                format_number(snapshot.metrics.combined_stable_balance)
            );
        }
    }
    let _ = writeln!(out, "Backing Ratio: {}", format_ratio(snapshot.metrics.backing_ratio));
    let _ = writeln!(
        out,
        "Treasury Value: ${:.2}",
        snapshot.metrics.treasury_total_value
    );
    out
}

/// `SYMBOL: amount ($usd)`; amount and USD are blank until the read resolves.
pub fn balance_line(token: Token, observation: &BalanceObservation, prices: &PriceSnapshot) -> String {
    let Some(amount) = observation.amount() else {
        return format!("{}: ", token);
    };

    if !token.is_priced() {
        return format!("{}: {}", token, amount.formatted());
    }

    format!(
        "{}: {}{}",
        token,
        amount.formatted(),
        format_usd(amount.ui_amount, prices.price(token))
    )
}

/// ` ($x.xx)` suffix, empty when the amount is not a number.
pub fn format_usd(amount: f64, price: f64) -> String {
    if amount.is_nan() {
        return String::new();
    }
    format!(" (${:.2})", usd_value(amount, price))
}

pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(ratio) => format!("{:.2}%", ratio),
        None => PLACEHOLDER.to_string(),
    }
}

/// Thousands separators and at most three fraction digits.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }

    let fixed = format!("{:.3}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bigdecimal::num_bigint::BigInt;

    use crate::market::SupplyStat;
    use crate::token::structs::TokenAmount;
    use crate::valuation::DerivedMetrics;

    fn resolved(token: Token, raw: u64, decimals: u8) -> BalanceObservation {
        BalanceObservation::Resolved(TokenAmount::new("0xowner", token, BigInt::from(raw), decimals))
    }

    fn snapshot(variant: Variant) -> DashboardSnapshot {
        DashboardSnapshot {
            variant,
            wallet_address: None,
            treasury_address: "0xtreasury".into(),
            user: vec![],
            treasury: vec![
                (Token::Kartel, BalanceObservation::Failed("rpc down".into())),
                (Token::Usdc, resolved(Token::Usdc, 200_000_000, 6)),
                (Token::Peso, BalanceObservation::Pending),
                (Token::Lp, resolved(Token::Lp, 1_500_000, 6)),
            ],
            prices: PriceSnapshot::with_kartel(0.002),
            supply: SupplyStat::default(),
            metrics: DerivedMetrics {
                combined_stable_balance: 200.0,
                treasury_total_value: 200.0,
                backing_ratio: None,
            },
        }
    }

    #[test]
    fn test_balance_lines() {
        let prices = PriceSnapshot::with_kartel(0.002);

        assert_eq!(
            balance_line(Token::Usdc, &resolved(Token::Usdc, 1_500_000, 6), &prices),
            "USDC: 1.5 ($1.50)"
        );
        assert_eq!(
            balance_line(Token::Lp, &resolved(Token::Lp, 1_500_000, 6), &prices),
            "KARTEL/PESO LP: 1.5"
        );
        assert_eq!(
            balance_line(Token::Kartel, &BalanceObservation::Failed("x".into()), &prices),
            "KARTEL: "
        );
        assert_eq!(
            balance_line(Token::Peso, &BalanceObservation::Pending, &prices),
            "PESO: "
        );
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_ratio(None), "...");
        assert_eq!(format_ratio(Some(100.0)), "100.00%");
        assert_eq!(format_ratio(Some(12.3456)), "12.35%");
        assert_eq!(format_usd(f64::NAN, 1.0), "");
        assert_eq!(format_usd(2.0, 0.05), " ($0.10)");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1234567.891), "1,234,567.891");
        assert_eq!(format_number(2000.0), "2,000");
        assert_eq!(format_number(999.5), "999.5");
    }

    #[test]
    fn test_render_zero_supply_shows_placeholder() {
        let text = render(&snapshot(Variant::Reserves));

        assert!(text.contains("Backing Ratio: ..."));
        assert!(!text.contains("NaN"));
        assert!(!text.contains("inf"));
        assert!(text.contains("USDC Reserves: $0"));
        assert!(text.contains("Connect a wallet to see balances"));
        assert!(text.contains("MINTING 20 PESO per 1 USDC"));
        assert!(text.contains("TREASURY 0xtreasury"));
        assert!(text.contains("USDC: 200 ($200.00)"));
        assert!(text.contains("KARTEL: \n"));
    }

    #[test]
    fn test_render_treasury_variant_layout() {
        let mut snapshot = snapshot(Variant::Treasury);
        snapshot.metrics.backing_ratio = Some(250.0);
        snapshot.supply.peso_circulating = 1600.0;
        let text = render(&snapshot);

        assert!(text.starts_with("TREASURY"));
        assert!(!text.contains("MINTING"));
        assert!(!text.contains("USDC Reserves"));
        assert!(text.contains("USDC Backing: $200"));
        assert!(text.contains("PESO Circulating Supply: 1,600"));
        assert!(text.contains("Backing Ratio: 250.00%"));
    }
}
