//! Settings for the sponsor-pool client
//!
//! ## Configuration
//!
//! Binaries read settings from the config files, then from environment. Keys
//! are snake_case; the shape is
//!
//! ```json
//! {
//!   "wallet": { "type": "http", "url": "http://localhost:8545" },
//!   "registry": { "address": "0x..." },
//!   "confirmation": { "poll_interval_ms": 4000, "timeout_secs": 600 },
//!   "tracing": { "fmt": "pretty", "level": "info" }
//! }
//! ```
//!
//! `wallet` may be left out entirely, in which case every action that needs
//! an account reports that no wallet is available.
//!
//! ### Configuration value precedence
//!
//! Configuration key/value pairs are loaded in the following order, with later
//! sources taking precedence:
//!
//! 1. The files matching `config/*.json`, if that directory exists.
//! 2. The order of configs in `CONFIG_FILES` with each sequential one
//!    overwriting previous ones as appropriate.
//! 3. Configuration env vars with the prefix `SPONSOR_BASE` intended
//!    to be shared by every binary in the same environment.
//!    E.g. `export SPONSOR_BASE_REGISTRY__ADDRESS=0x...`
//! 4. Configuration env vars with the prefix `SPONSOR_<agent_prefix>`
//!    intended to be used by a specific binary.
//!    E.g. `export SPONSOR_CLI_CONFIRMATION__TIMEOUT_SECS=120`
//!
//! Nesting in env var names is written with a double underscore so that
//! snake_case keys survive.

use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use serde::Deserialize;
use tracing::warn;

use sponsor_core::Address;
use sponsor_ethereum::{ConnectionConf, EthereumConnection, DEFAULT_POLL_INTERVAL};

use crate::{SponsorClient, WalletBackend};

pub use self::trace::*;

mod loader;

/// Tracing subscriber management
pub mod trace;

/// Where the registry lives.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConf {
    /// Address of the registry contract
    pub address: Address,
}

/// How confirmations are awaited.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmationConf {
    /// Receipt polling interval; defaults to the provider's
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    /// Give up watching after this many seconds; unset waits indefinitely
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ConfirmationConf {
    /// Receipt polling interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    /// Deadline for a single confirmation watch, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Settings shared by every sponsor-pool binary.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Wallet endpoint; absent means no wallet capability
    #[serde(default)]
    pub wallet: Option<ConnectionConf>,
    /// Registry location
    pub registry: RegistryConf,
    /// Confirmation tracking
    #[serde(default)]
    pub confirmation: ConfirmationConf,
    /// Logging
    #[serde(default)]
    pub tracing: TracingConfig,
}

impl Settings {
    /// Load settings from the config locations for the binary named
    /// `agent_prefix`.
    pub fn load(agent_prefix: &str) -> Result<Self> {
        loader::load_settings_object(agent_prefix)
    }

    /// Connect to the configured wallet endpoint, if any, and build a client
    /// for the configured registry.
    pub fn build_client(&self) -> Result<SponsorClient> {
        let backend = match &self.wallet {
            Some(conf) => {
                let connection = EthereumConnection::from_conf(conf)?;
                Some(WalletBackend::new(
                    Arc::new(connection.wallet()),
                    Arc::new(connection.contract_factory()),
                    Arc::new(
                        connection.confirmation_channel(self.confirmation.poll_interval()),
                    ),
                ))
            }
            None => {
                warn!("No wallet endpoint configured");
                None
            }
        };
        Ok(SponsorClient::new(
            backend,
            self.registry.address,
            self.confirmation.deadline(),
        ))
    }
}
