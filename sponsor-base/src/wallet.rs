use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use sponsor_core::{Account, SponsorError, SponsorResult, WalletCapability};

/// Where the wallet connection stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No account authorized
    #[default]
    Disconnected,
    /// An authorization request is open in the wallet
    Connecting,
    /// The wallet authorized this account
    Connected(Account),
}

impl ConnectionState {
    /// The authorized account, if connected.
    pub fn account(&self) -> Option<Account> {
        match self {
            Self::Connected(account) => Some(*account),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("Connect"),
            Self::Connecting => f.write_str("Connecting"),
            Self::Connected(account) => write!(f, "Connected as {account}"),
        }
    }
}

/// Requests account authorization from the wallet capability and tracks
/// the result. Observers subscribe to state changes instead of polling.
#[derive(Debug)]
pub struct WalletConnector {
    wallet: Option<Arc<dyn WalletCapability>>,
    state: watch::Sender<ConnectionState>,
}

impl WalletConnector {
    /// Create a connector. `None` means no wallet capability is present.
    pub fn new(wallet: Option<Arc<dyn WalletCapability>>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self { wallet, state }
    }

    /// True if a wallet capability is present at all.
    pub fn is_available(&self) -> bool {
        self.wallet.is_some()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Observe connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// The authorized account, if any.
    pub fn current_account(&self) -> Option<Account> {
        self.state().account()
    }

    /// Ask the wallet to authorize an account. The first account it returns
    /// becomes the signing account. On failure the connector is left
    /// disconnected.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> SponsorResult<Account> {
        let Some(wallet) = self.wallet.as_ref() else {
            warn!("No wallet capability present");
            return Err(SponsorError::WalletUnavailable);
        };

        self.state.send_replace(ConnectionState::Connecting);
        let result = match wallet.request_accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(address) => Ok(Account::new(*address)),
                None => {
                    warn!("Wallet returned no accounts");
                    Err(SponsorError::AuthorizationDenied)
                }
            },
            Err(err) if err.is_rejection() => {
                warn!(error = %err, "Wallet declined account authorization");
                Err(SponsorError::AuthorizationDenied)
            }
            Err(err) => {
                warn!(error = %err, "Wallet unreachable");
                Err(SponsorError::WalletUnavailable)
            }
        };

        match result {
            Ok(account) => {
                info!(%account, "Wallet connected");
                self.state.send_replace(ConnectionState::Connected(account));
                Ok(account)
            }
            Err(err) => {
                self.state.send_replace(ConnectionState::Disconnected);
                Err(err)
            }
        }
    }

    /// Re-read the accounts the wallet currently exposes, without prompting.
    /// A changed or missing first account moves the state along, which marks
    /// handles bound to the old account as stale.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> SponsorResult<Option<Account>> {
        let Some(wallet) = self.wallet.as_ref() else {
            return Err(SponsorError::WalletUnavailable);
        };
        let accounts = wallet.current_accounts().await.map_err(|err| {
            warn!(error = %err, "Failed to read wallet accounts");
            SponsorError::WalletUnavailable
        })?;

        let next = match accounts.first() {
            Some(address) => ConnectionState::Connected(Account::new(*address)),
            None => ConnectionState::Disconnected,
        };
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed {
            debug!(state = %next, "Wallet account changed");
        }
        Ok(next.account())
    }
}
