use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{ChainResult, Confirmation, H256};

/// The network's notification channel for transaction inclusion.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait ConfirmationChannel: Send + Sync + Debug {
    /// Suspend until the first confirmation of `hash` is observed. Errors if
    /// the channel fails or the transaction is dropped.
    async fn once_confirmed(&self, hash: H256) -> ChainResult<Confirmation>;
}
