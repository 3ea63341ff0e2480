//! Ethereum JSON-RPC adapters for the sponsor-pool client traits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub use confirmation::*;
pub use instance::*;
pub use registry::*;
pub use retrying::{RetryingProvider, RetryingProviderError};
pub use trait_builder::*;
pub use wallet::*;

mod tx;

/// Receipt polling
mod confirmation;

/// Instance contract calls
mod instance;

/// Registry contract calls
mod registry;

/// Retrying Provider
mod retrying;

mod trait_builder;

/// EIP-1193 account requests
mod wallet;

/// Ethereum connection configuration
#[derive(Debug, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConnectionConf {
    /// HTTP connection details
    Http {
        /// Fully qualified string to connect to
        url: String,
        /// Attempts per request before giving up
        #[serde(default)]
        max_requests: Option<u32>,
        /// Backoff before the first retry, doubled on each attempt
        #[serde(default)]
        base_retry_ms: Option<u64>,
    },
}

impl Default for ConnectionConf {
    fn default() -> Self {
        Self::Http {
            url: Default::default(),
            max_requests: None,
            base_retry_ms: None,
        }
    }
}
