use std::time::Duration;

pub const BASE_CHAIN_ID: u64 = 8453;
pub const BASE_RPC_URL: &str = "https://mainnet.base.org";

pub const KARTEL: &str = "0xC680eca227FC9AB21A9210E0EaFEff9068a89327";
pub const USDC: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
pub const PESO: &str = "0x1423569894d749AdE3f2b677Ea6220e2366E7AaC";
pub const KARTEL_PESO_LP: &str = "0x24e8f008519c7a9cc414e21a19aba500c6c5fe46";
pub const TREASURY: &str = "0xF08a91c214c42a0F51DE0C5691FDf6Fa37e6E1f2";

pub const KARTEL_PAIR: &str = "0x5e7dc4b68105b561e2397b7395fcbbe2a1fd29fe";
pub const DEXSCREENER_API_URL: &str = "https://api.dexscreener.com";
pub const BASESCAN_API_URL: &str = "https://api.basescan.org/api";

/// PESO is pegged by policy, never fetched.
pub const PESO_PRICE_USD: f64 = 0.05;
pub const USDC_PRICE_USD: f64 = 1.0;

pub const PESO_DECIMALS: u8 = 18;
pub const USDC_DECIMALS: u8 = 6;

pub const POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const BALANCE_REFRESH_INTERVAL: Duration = Duration::from_secs(12);
pub const RENDER_INTERVAL: Duration = Duration::from_secs(15);

pub const PLACEHOLDER: &str = "...";
