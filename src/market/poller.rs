use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use std::sync::Arc;
use std::time::Duration;

use super::{MarketState, PriceFeed, SupplySource};

/// Drives the price fetch and the supply fetch off one timer.
///
/// Each tick fires both fetches as separate tasks; the timer never waits for
/// them, so a hung request only delays its own update.
pub struct MarketPoller {
    price_feed: Arc<dyn PriceFeed>,
    supply_source: Arc<dyn SupplySource>,
    state: MarketState,
    interval: Duration,
    fetch_reserves: bool,
}

impl MarketPoller {
    pub fn new(
        price_feed: Arc<dyn PriceFeed>,
        supply_source: Arc<dyn SupplySource>,
        state: MarketState,
        interval: Duration,
    ) -> Self {
        Self {
            price_feed,
            supply_source,
            state,
            interval,
            fetch_reserves: true,
        }
    }

    pub fn with_reserves(mut self, fetch_reserves: bool) -> Self {
        self.fetch_reserves = fetch_reserves;
        self
    }

    /// Spawn the polling loop. The first round fires immediately.
    pub fn start(self) -> PollerHandle {
        let state = self.state.clone();
        let task = tokio::spawn(self.run_loop());

        PollerHandle {
            state,
            task: Some(task),
        }
    }

    async fn run_loop(self) {
        let mut round: u64 = 1;
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Dropped with this future on abort, which aborts every in-flight fetch.
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    tracing::debug!("Running market poll round {}", round);

                    in_flight.spawn(poll_price(self.price_feed.clone(), self.state.clone()));
                    in_flight.spawn(poll_supply(
                        self.supply_source.clone(),
                        self.state.clone(),
                        self.fetch_reserves,
                    ));

                    round += 1;
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!("Market fetch task failed: {}", e);
                    }
                }
            }
        }
    }
}

async fn poll_price(feed: Arc<dyn PriceFeed>, state: MarketState) {
    match feed.fetch_price().await {
        Ok(price) => {
            if state.set_kartel_price(price).await {
                tracing::debug!("KARTEL price updated: ${}", price);
            }
        }
        Err(e) => tracing::error!("Failed to fetch price: {:#}", e),
    }
}

async fn poll_supply(source: Arc<dyn SupplySource>, state: MarketState, fetch_reserves: bool) {
    let reserves = async {
        if fetch_reserves {
            Some(source.stable_reserves().await)
        } else {
            None
        }
    };
    let (supply, reserves) = tokio::join!(source.circulating_supply(), reserves);

    match supply {
        Ok(supply) => {
            if state.set_circulating_supply(supply).await {
                tracing::debug!("PESO circulating supply updated: {}", supply);
            }
        }
        Err(e) => tracing::error!("Failed to fetch PESO supply: {:#}", e),
    }

    match reserves {
        Some(Ok(reserves)) => {
            if state.set_stable_reserves(reserves).await {
                tracing::debug!("USDC reserves updated: {}", reserves);
            }
        }
        Some(Err(e)) => tracing::error!("Failed to fetch USDC reserves: {:#}", e),
        None => {}
    }
}

/// Owns a running poller. Dropping it aborts the loop; `stop` also guarantees
/// that nothing is written to the market state afterwards.
pub struct PollerHandle {
    state: MarketState,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub async fn stop(mut self) {
        self.state.stop().await;
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        tracing::info!("Market poller stopped");
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
