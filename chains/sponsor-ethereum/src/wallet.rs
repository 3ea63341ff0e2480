use std::sync::Arc;

use async_trait::async_trait;
use ethers::prelude::{JsonRpcClient, Middleware, Provider};
use tracing::instrument;

use sponsor_core::{Address, ChainCommunicationError, ChainResult, WalletCapability};

/// A wallet reached over an EIP-1193 compatible JSON-RPC endpoint.
#[derive(Debug)]
pub struct EthereumWallet<P>
where
    P: JsonRpcClient,
{
    provider: Arc<Provider<P>>,
}

impl<P> EthereumWallet<P>
where
    P: JsonRpcClient + 'static,
{
    /// Create a wallet capability on top of a provider.
    pub fn new(provider: Arc<Provider<P>>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P> WalletCapability for EthereumWallet<P>
where
    P: JsonRpcClient + 'static,
{
    #[instrument(err, ret, skip(self))]
    async fn request_accounts(&self) -> ChainResult<Vec<Address>> {
        self.provider
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await
            .map_err(ChainCommunicationError::from_provider_error)
    }

    #[instrument(level = "debug", err, ret, skip(self))]
    async fn current_accounts(&self) -> ChainResult<Vec<Address>> {
        self.provider
            .get_accounts()
            .await
            .map_err(ChainCommunicationError::from_provider_error)
    }
}
