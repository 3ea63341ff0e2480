use async_trait::async_trait;
use ethers::prelude::Middleware;
use ethers_contract::Contract;
use tracing::instrument;

use sponsor_core::{
    instance_methods, Address, ChainResult, InstanceContract, SponsorContract, H256, U256,
};

use crate::tx::dispatch_tx;

/// A reference to an instance contract on some Ethereum chain, bound to the
/// account its transactions are sent from.
#[derive(Debug)]
pub struct EthereumInstance<M>
where
    M: Middleware,
{
    contract: Contract<M>,
}

impl<M> EthereumInstance<M>
where
    M: Middleware + 'static,
{
    /// Wrap a contract handle built from the instance interface descriptor.
    /// The handle's client decides the sending account.
    pub fn new(contract: Contract<M>) -> Self {
        Self { contract }
    }
}

impl<M> SponsorContract for EthereumInstance<M>
where
    M: Middleware + 'static,
{
    fn address(&self) -> Address {
        self.contract.address()
    }
}

#[async_trait]
impl<M> InstanceContract for EthereumInstance<M>
where
    M: Middleware + 'static,
{
    #[instrument(level = "debug", err, skip(self))]
    async fn display_name(&self) -> ChainResult<String> {
        Ok(self
            .contract
            .method::<_, String>(instance_methods::NAME, ())?
            .call()
            .await?)
    }

    #[instrument(level = "debug", err, skip(self))]
    async fn reference_uri(&self) -> ChainResult<String> {
        Ok(self
            .contract
            .method::<_, String>(instance_methods::REFERENCE_URI, ())?
            .call()
            .await?)
    }

    #[instrument(level = "debug", err, ret, skip(self))]
    async fn beneficiary(&self) -> ChainResult<Address> {
        Ok(self
            .contract
            .method::<_, Address>(instance_methods::BENEFICIARY, ())?
            .call()
            .await?)
    }

    #[instrument(level = "debug", err, ret, skip(self))]
    async fn balance_of(&self, account: Address) -> ChainResult<U256> {
        Ok(self
            .contract
            .method::<_, U256>(instance_methods::BALANCE_OF, account)?
            .call()
            .await?)
    }

    #[instrument(level = "debug", err, ret, skip(self))]
    async fn total_supply(&self) -> ChainResult<U256> {
        Ok(self
            .contract
            .method::<_, U256>(instance_methods::TOTAL_SUPPLY, ())?
            .call()
            .await?)
    }

    #[instrument(err, skip(self), fields(instance = ?self.contract.address()))]
    async fn mint(&self, value: U256) -> ChainResult<H256> {
        let call = self
            .contract
            .method::<_, ()>(instance_methods::MINT, ())?
            .value(value);
        dispatch_tx(self.contract.client_ref(), &call).await
    }

    #[instrument(err, skip(self), fields(instance = ?self.contract.address()))]
    async fn redeem(&self, amount: U256) -> ChainResult<H256> {
        let call = self
            .contract
            .method::<_, ()>(instance_methods::REDEEM, amount)?;
        dispatch_tx(self.contract.client_ref(), &call).await
    }
}
