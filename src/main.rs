mod balance;
mod config;
mod constant;
mod dashboard;
mod market;
mod token;
mod valuation;
mod wallet;

use anyhow::Result;

use std::sync::Arc;

use crate::balance::rpc::RpcBalanceProvider;
use crate::balance::BalanceBook;
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::market::basescan::BaseScanClient;
use crate::market::dexscreener::DexScreenerFeed;
use crate::market::poller::MarketPoller;
use crate::market::MarketState;
use crate::wallet::WalletSession;

#[tokio::main]
async fn main() -> Result<()> {
    setup_env_and_tracing();

    let config = Arc::new(Config::from_env()?);
    tracing::info!(
        "Starting KARTEL dashboard ({:?} variant) on chain {}",
        config.variant,
        config.chain_id
    );

    let rpc = RpcBalanceProvider::new(&config.rpc_url)?;
    match rpc.chain_id().await {
        Ok(chain_id) if chain_id == config.chain_id => {}
        Ok(chain_id) => tracing::warn!(
            "RPC {} reports chain {}, expected {}",
            config.rpc_url,
            chain_id,
            config.chain_id
        ),
        Err(e) => tracing::warn!("Failed to query chain id from {}: {:#}", config.rpc_url, e),
    }

    let session = WalletSession::from_config(&config);
    let balances = Arc::new(BalanceBook::new(Arc::new(rpc), config.clone(), session));

    let price_feed = DexScreenerFeed::new(&config.dexscreener_api_url, &config.kartel_pair)?;
    tracing::info!("KARTEL price feed: {}", price_feed.url());

    let market = MarketState::new();
    let poller = MarketPoller::new(
        Arc::new(price_feed),
        Arc::new(BaseScanClient::new(&config)?),
        market.clone(),
        config.poll_interval,
    )
    .with_reserves(config.variant.fetches_reserves())
    .start();

    let dashboard = Dashboard::new(
        config.variant,
        config.treasury.clone(),
        balances.clone(),
        market,
    );

    let refresher = balances.clone().spawn_refresh(config.balance_refresh_interval);
    let mut render_timer = tokio::time::interval(config.render_interval);

    loop {
        tokio::select! {
            _ = render_timer.tick() => {
                tracing::info!("\n{}", dashboard.render().await);
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for shutdown signal: {}", e);
                }
                break;
            }
        }
    }

    refresher.abort();
    poller.stop().await;
    tracing::info!("Dashboard shut down");

    Ok(())
}

pub fn setup_env_and_tracing() {
    dotenv::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
