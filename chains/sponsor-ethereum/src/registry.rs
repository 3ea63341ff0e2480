use async_trait::async_trait;
use ethers::prelude::Middleware;
use ethers_contract::Contract;
use tracing::instrument;

use sponsor_core::{
    registry_methods, Address, ChainCommunicationError, ChainResult, RegistryContract,
    SponsorContract, U256,
};

/// A reference to the registry contract on some Ethereum chain
#[derive(Debug)]
pub struct EthereumRegistry<M>
where
    M: Middleware,
{
    contract: Contract<M>,
}

impl<M> EthereumRegistry<M>
where
    M: Middleware + 'static,
{
    /// Wrap a contract handle built from the registry interface descriptor.
    pub fn new(contract: Contract<M>) -> Self {
        Self { contract }
    }
}

impl<M> SponsorContract for EthereumRegistry<M>
where
    M: Middleware + 'static,
{
    fn address(&self) -> Address {
        self.contract.address()
    }
}

#[async_trait]
impl<M> RegistryContract for EthereumRegistry<M>
where
    M: Middleware + 'static,
{
    #[instrument(level = "debug", err, ret, skip(self), fields(registry = ?self.contract.address()))]
    async fn instance_count(&self) -> ChainResult<u64> {
        let count: U256 = self
            .contract
            .method::<_, U256>(registry_methods::INSTANCE_COUNT, ())?
            .call()
            .await?;
        if count > U256::from(u64::MAX) {
            return Err(ChainCommunicationError::from_other_str(format!(
                "registry reported {count} instances"
            )));
        }
        Ok(count.as_u64())
    }

    #[instrument(level = "debug", err, ret, skip(self), fields(registry = ?self.contract.address()))]
    async fn instance_at(&self, index: u64) -> ChainResult<Address> {
        Ok(self
            .contract
            .method::<_, Address>(registry_methods::INSTANCE_AT, U256::from(index))?
            .call()
            .await?)
    }
}
