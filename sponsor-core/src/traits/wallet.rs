//! The wallet capability is whatever holds the user's keys: a browser
//! extension, a node with unlocked accounts, a hardware signer bridge. The
//! client only ever asks it for authorized accounts; signing happens
//! implicitly when a state-changing call is sent through a bound contract.

use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{Address, ChainResult};

/// Interface for account authorization against a wallet.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait WalletCapability: Send + Sync + Debug {
    /// Ask the wallet to authorize account access. May prompt the user and
    /// may be rejected.
    async fn request_accounts(&self) -> ChainResult<Vec<Address>>;

    /// Accounts currently authorized, without prompting.
    async fn current_accounts(&self) -> ChainResult<Vec<Address>>;
}
