use crate::config::Config;

/// Connection state of the user's wallet.
///
/// The dashboard never signs anything, so a session is just an optional
/// address; no address means the user is not connected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    address: Option<String>,
}

impl WalletSession {
    pub fn connected(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        match &config.wallet_address {
            Some(address) => {
                tracing::info!("Wallet connected: {}", address);
                Self::connected(address.clone())
            }
            None => {
                tracing::info!("No wallet connected, user balances stay hidden");
                Self::disconnected()
            }
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_config() {
        let mut config = Config::default();
        assert!(!WalletSession::from_config(&config).is_connected());

        config.wallet_address = Some("0xabc".into());
        let session = WalletSession::from_config(&config);
        assert!(session.is_connected());
        assert_eq!(session.address(), Some("0xabc"));
    }
}
