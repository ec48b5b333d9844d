pub mod rpc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::token::structs::{TokenAmount, TokenInfo};
use crate::token::Token;
use crate::wallet::WalletSession;

/// Reads a single ERC-20 balance for an owner.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn get_balance(&self, owner: &str, token: &TokenInfo) -> Result<TokenAmount>;
}

/// Latest known state of one (owner, token) balance read.
#[derive(Debug, Clone, PartialEq)]
pub enum BalanceObservation {
    Pending,
    Resolved(TokenAmount),
    Failed(String),
}

impl BalanceObservation {
    pub fn amount(&self) -> Option<&TokenAmount> {
        match self {
            BalanceObservation::Resolved(amount) => Some(amount),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Holder {
    User,
    Treasury,
}

/// Holds one observation per (holder, token) pair and re-resolves them on demand.
///
/// User observations stay `Pending` while no wallet is connected.
pub struct BalanceBook {
    provider: Arc<dyn BalanceProvider>,
    config: Arc<Config>,
    session: WalletSession,
    observations: Arc<RwLock<HashMap<(Holder, Token), BalanceObservation>>>,
}

impl BalanceBook {
    pub fn new(
        provider: Arc<dyn BalanceProvider>,
        config: Arc<Config>,
        session: WalletSession,
    ) -> Self {
        let mut observations = HashMap::new();
        for holder in [Holder::User, Holder::Treasury] {
            for token in Token::ALL {
                observations.insert((holder, token), BalanceObservation::Pending);
            }
        }

        Self {
            provider,
            config,
            session,
            observations: Arc::new(RwLock::new(observations)),
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    fn owner(&self, holder: Holder) -> Option<String> {
        match holder {
            Holder::User => self.session.address().map(|a| a.to_string()),
            Holder::Treasury => Some(self.config.treasury.clone()),
        }
    }

    pub async fn observe(&self, holder: Holder, token: Token) -> BalanceObservation {
        self.observations
            .read()
            .await
            .get(&(holder, token))
            .cloned()
            .unwrap_or(BalanceObservation::Pending)
    }

    /// All four observations of a holder, in `Token::ALL` order.
    pub async fn holdings(&self, holder: Holder) -> Vec<(Token, BalanceObservation)> {
        let mut holdings = Vec::with_capacity(Token::ALL.len());
        for token in Token::ALL {
            holdings.push((token, self.observe(holder, token).await));
        }
        holdings
    }

    /// Re-resolve every observation concurrently.
    ///
    /// A failed read never touches the other pairs. A pair that resolved before
    /// keeps its last value when a later read fails.
    pub async fn refresh(&self) {
        if !self.session.is_connected() {
            tracing::debug!("No wallet connected, reading treasury balances only");
        }

        let mut reads = JoinSet::new();
        for holder in [Holder::User, Holder::Treasury] {
            let Some(owner) = self.owner(holder) else {
                continue;
            };
            for token in Token::ALL {
                let provider = self.provider.clone();
                let owner = owner.clone();
                let info = self.config.token(token).clone();
                reads.spawn(async move {
                    let result = provider.get_balance(&owner, &info).await;
                    (holder, token, result)
                });
            }
        }

        while let Some(joined) = reads.join_next().await {
            let (holder, token, result) = match joined {
                Ok(read) => read,
                Err(e) => {
                    tracing::error!("Balance read task failed: {}", e);
                    continue;
                }
            };

            let mut observations = self.observations.write().await;
            let entry = observations
                .entry((holder, token))
                .or_insert(BalanceObservation::Pending);
            match result {
                Ok(amount) => {
                    tracing::debug!("{} {} balance: {}", amount.owner, token, amount.formatted());
                    *entry = BalanceObservation::Resolved(amount);
                }
                Err(e) => {
                    tracing::error!("Failed to read {:?} {} balance: {:#}", holder, token, e);
                    if !matches!(entry, BalanceObservation::Resolved(_)) {
                        *entry = BalanceObservation::Failed(e.to_string());
                    }
                }
            }
        }
    }

    /// Refresh on a timer in a task of its own, starting immediately.
    ///
    /// Slow reads hold up the next refresh only, never the caller.
    pub fn spawn_refresh(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(every);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;
                self.refresh().await;
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use bigdecimal::num_bigint::BigInt;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Serves fixed whole-token balances, failing for one token when asked to.
    pub struct FakeBalances {
        pub balances: HashMap<(String, Token), u64>,
        pub failing: Option<Token>,
        pub fail_all: AtomicBool,
        pub calls: AtomicUsize,
        pub delay: Duration,
    }

    impl FakeBalances {
        pub fn new(balances: &[(&str, Token, u64)]) -> Self {
            Self {
                balances: balances
                    .iter()
                    .map(|(owner, token, amount)| ((owner.to_string(), *token), *amount))
                    .collect(),
                failing: None,
                fail_all: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl BalanceProvider for FakeBalances {
        async fn get_balance(&self, owner: &str, token: &TokenInfo) -> Result<TokenAmount> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing == Some(token.token) || self.fail_all.load(Ordering::SeqCst) {
                anyhow::bail!("execution reverted");
            }
            let whole = self
                .balances
                .get(&(owner.to_string(), token.token))
                .copied()
                .unwrap_or(0);
            let raw = BigInt::from(whole) * BigInt::from(10u64).pow(token.decimals as u32);
            Ok(TokenAmount::new(owner, token.token, raw, token.decimals))
        }
    }

    fn new_book(provider: FakeBalances, session: WalletSession) -> (BalanceBook, Arc<FakeBalances>) {
        let provider = Arc::new(provider);
        let book = BalanceBook::new(provider.clone(), Arc::new(Config::default()), session);
        (book, provider)
    }

    #[tokio::test]
    async fn test_observations_start_pending() {
        let (book, _) = new_book(FakeBalances::new(&[]), WalletSession::connected("0xuser"));

        for token in Token::ALL {
            assert_eq!(
                book.observe(Holder::Treasury, token).await,
                BalanceObservation::Pending
            );
        }
    }

    #[tokio::test]
    async fn test_refresh_resolves_all_eight_pairs() {
        let treasury = crate::constant::TREASURY;
        let (book, _) = new_book(
            FakeBalances::new(&[
                ("0xuser", Token::Kartel, 10),
                (treasury, Token::Usdc, 200),
                (treasury, Token::Peso, 500),
            ]),
            WalletSession::connected("0xuser"),
        );

        book.refresh().await;

        for holder in [Holder::User, Holder::Treasury] {
            for (_, observation) in book.holdings(holder).await {
                assert!(matches!(observation, BalanceObservation::Resolved(_)));
            }
        }
        let usdc = book.observe(Holder::Treasury, Token::Usdc).await;
        assert_eq!(usdc.amount().unwrap().ui_amount, 200.0);
        let kartel = book.observe(Holder::User, Token::Kartel).await;
        assert_eq!(kartel.amount().unwrap().ui_amount, 10.0);
    }

    #[tokio::test]
    async fn test_single_failure_is_isolated() {
        let mut provider = FakeBalances::new(&[(crate::constant::TREASURY, Token::Peso, 500)]);
        provider.failing = Some(Token::Kartel);
        let (book, _) = new_book(provider, WalletSession::connected("0xuser"));

        book.refresh().await;

        for holder in [Holder::User, Holder::Treasury] {
            for (token, observation) in book.holdings(holder).await {
                if token == Token::Kartel {
                    assert!(matches!(observation, BalanceObservation::Failed(_)));
                } else {
                    assert!(matches!(observation, BalanceObservation::Resolved(_)));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_resolved_value() {
        let (book, provider) = new_book(
            FakeBalances::new(&[(crate::constant::TREASURY, Token::Usdc, 200)]),
            WalletSession::disconnected(),
        );

        book.refresh().await;
        provider.fail_all.store(true, Ordering::SeqCst);
        book.refresh().await;

        let usdc = book.observe(Holder::Treasury, Token::Usdc).await;
        assert_eq!(usdc.amount().unwrap().ui_amount, 200.0);
    }

    #[tokio::test]
    async fn test_disconnected_user_stays_pending() {
        let (book, _) = new_book(FakeBalances::new(&[]), WalletSession::disconnected());

        book.refresh().await;

        for (_, observation) in book.holdings(Holder::User).await {
            assert_eq!(observation, BalanceObservation::Pending);
        }
        for (_, observation) in book.holdings(Holder::Treasury).await {
            assert!(matches!(observation, BalanceObservation::Resolved(_)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_refresh_runs_on_interval() {
        let (book, provider) = new_book(
            FakeBalances::new(&[(crate::constant::TREASURY, Token::Usdc, 200)]),
            WalletSession::disconnected(),
        );
        let book = Arc::new(book);

        let task = book.clone().spawn_refresh(Duration::from_secs(12));
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
        let usdc = book.observe(Holder::Treasury, Token::Usdc).await;
        assert_eq!(usdc.amount().unwrap().ui_amount, 200.0);

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 8);

        task.abort();
        let _ = task.await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_refresh_does_not_block_caller() {
        let mut provider = FakeBalances::new(&[]);
        provider.delay = Duration::from_secs(30);
        let (book, _) = new_book(provider, WalletSession::disconnected());
        let book = Arc::new(book);

        let task = book.clone().spawn_refresh(Duration::from_secs(12));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!task.is_finished());
        assert_eq!(
            book.observe(Holder::Treasury, Token::Usdc).await,
            BalanceObservation::Pending
        );

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(book.observe(Holder::Treasury, Token::Usdc).await.amount().is_some());
        task.abort();
    }
}
