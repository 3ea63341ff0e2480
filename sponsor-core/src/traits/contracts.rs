use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{Address, ChainResult, H256, U256};

/// Interface for a deployed contract.
#[auto_impl(&, Box, Arc)]
pub trait SponsorContract: Send + Sync + Debug {
    /// Return the address of this contract.
    fn address(&self) -> Address;
}

/// Read-only interface of the registry contract.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait RegistryContract: SponsorContract {
    /// Total number of registered instances.
    async fn instance_count(&self) -> ChainResult<u64>;

    /// Address of the instance at `index`.
    async fn instance_at(&self, index: u64) -> ChainResult<Address>;
}

/// Interface of an instance contract, bound to a signing account.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait InstanceContract: SponsorContract {
    /// Display name.
    async fn display_name(&self) -> ChainResult<String>;

    /// External reference URI.
    async fn reference_uri(&self) -> ChainResult<String>;

    /// Beneficiary of deposited funds.
    async fn beneficiary(&self) -> ChainResult<Address>;

    /// Claim balance of `account`, in base units.
    async fn balance_of(&self, account: Address) -> ChainResult<U256>;

    /// Total claims outstanding, in base units.
    async fn total_supply(&self) -> ChainResult<U256>;

    /// Send `mint()` with `value` attached. Resolves once the network has
    /// accepted the transaction, returning its hash.
    async fn mint(&self, value: U256) -> ChainResult<H256>;

    /// Send `redeem(amount)`. Resolves once the network has accepted the
    /// transaction, returning its hash.
    async fn redeem(&self, amount: U256) -> ChainResult<H256>;
}
