use std::sync::Arc;
use std::time::Duration;

use ethers::abi::{parse_abi, Abi};
use ethers::prelude::{Http, JsonRpcClient, Provider};
use ethers_contract::Contract;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use sponsor_core::{
    Account, ChainCommunicationError, ChainResult, ContractFactory, ContractRef, ContractRole,
    InstanceContract, RegistryContract,
};

use crate::{
    ConnectionConf, EthereumConfirmationChannel, EthereumInstance, EthereumRegistry,
    EthereumWallet, RetryingProvider,
};

const HTTP_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// An error when connecting to an ethereum provider.
#[derive(Error, Debug)]
pub enum EthereumProviderConnectionError {
    /// Underlying reqwest lib threw an error
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    /// A URL string could not be parsed
    #[error("Failed to parse url {1:?}: {0}")]
    InvalidUrl(url::ParseError, String),
}

impl From<EthereumProviderConnectionError> for ChainCommunicationError {
    fn from(e: EthereumProviderConnectionError) -> Self {
        ChainCommunicationError::from_other(e)
    }
}

/// Build a retrying HTTP provider from connection settings.
pub fn build_provider(
    conf: &ConnectionConf,
) -> Result<Provider<RetryingProvider<Http>>, EthereumProviderConnectionError> {
    match conf {
        ConnectionConf::Http {
            url,
            max_requests,
            base_retry_ms,
        } => {
            let http_client = Client::builder()
                .timeout(HTTP_CLIENT_TIMEOUT)
                .build()
                .map_err(EthereumProviderConnectionError::from)?;
            let parsed_url = url
                .parse::<Url>()
                .map_err(|e| EthereumProviderConnectionError::InvalidUrl(e, url.clone()))?;
            debug!(url = %parsed_url, "Connecting to wallet endpoint");
            let http_provider = Http::new_with_client(parsed_url, http_client);
            let retrying_http_provider =
                RetryingProvider::new(http_provider, *max_requests, *base_retry_ms);
            Ok(Provider::new(retrying_http_provider))
        }
    }
}

/// A live connection to the wallet endpoint, handing out the client-facing
/// capabilities that share it.
#[derive(Debug, Clone)]
pub struct EthereumConnection<P>
where
    P: JsonRpcClient,
{
    provider: Arc<Provider<P>>,
}

impl EthereumConnection<RetryingProvider<Http>> {
    /// Connect using connection settings.
    pub fn from_conf(conf: &ConnectionConf) -> Result<Self, EthereumProviderConnectionError> {
        Ok(Self::new(build_provider(conf)?))
    }
}

impl<P> EthereumConnection<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    /// Wrap an existing provider.
    pub fn new(provider: Provider<P>) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Account authorization through the endpoint.
    pub fn wallet(&self) -> EthereumWallet<P> {
        EthereumWallet::new(self.provider.clone())
    }

    /// Contract handles sending through the endpoint.
    pub fn contract_factory(&self) -> EthereumContractFactory<P> {
        EthereumContractFactory::new(self.provider.clone())
    }

    /// Receipt watcher polling the endpoint every `poll_interval`.
    pub fn confirmation_channel(&self, poll_interval: Duration) -> EthereumConfirmationChannel<P> {
        EthereumConfirmationChannel::new(self.provider.clone(), poll_interval)
    }
}

/// Builds dynamic contract handles from interface descriptors. Each handle
/// gets its own copy of the provider with the signing account as default
/// sender, so the wallet signs every transaction as that account.
#[derive(Debug)]
pub struct EthereumContractFactory<P>
where
    P: JsonRpcClient,
{
    provider: Arc<Provider<P>>,
}

impl<P> EthereumContractFactory<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    /// Create a factory on top of a provider.
    pub fn new(provider: Arc<Provider<P>>) -> Self {
        Self { provider }
    }

    fn bind(
        &self,
        contract: &ContractRef,
        expected: ContractRole,
        signer: Account,
    ) -> ChainResult<Contract<Provider<P>>> {
        if contract.role() != expected {
            return Err(ChainCommunicationError::from_other_str(format!(
                "cannot bind a {} reference as {expected}",
                contract.role()
            )));
        }
        let abi = interface_abi(contract)?;
        let client = Provider::clone(&self.provider).with_sender(signer.address());
        Ok(Contract::new(contract.address(), abi, Arc::new(client)))
    }
}

impl<P> ContractFactory for EthereumContractFactory<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    fn build_registry(
        &self,
        contract: &ContractRef,
        signer: Account,
    ) -> ChainResult<Arc<dyn RegistryContract>> {
        let contract = self.bind(contract, ContractRole::Registry, signer)?;
        Ok(Arc::new(EthereumRegistry::new(contract)))
    }

    fn build_instance(
        &self,
        contract: &ContractRef,
        signer: Account,
    ) -> ChainResult<Arc<dyn InstanceContract>> {
        let contract = self.bind(contract, ContractRole::Instance, signer)?;
        Ok(Arc::new(EthereumInstance::new(contract)))
    }
}

/// Parse the human-readable interface descriptor of a contract reference.
pub fn interface_abi(contract: &ContractRef) -> ChainResult<Abi> {
    parse_abi(&contract.interface().signatures())
        .map_err(ChainCommunicationError::from_contract_error)
}

#[cfg(test)]
mod test {
    use ethers::abi::{self, Token};
    use ethers::providers::{JsonRpcError, MockProvider, MockResponse};
    use ethers::types::{Block, Bytes, FeeHistory};

    use sponsor_core::{Address, H256, U256};

    use super::*;

    fn encoded(tokens: &[Token]) -> Bytes {
        Bytes::from(abi::encode(tokens))
    }

    fn factory() -> (EthereumContractFactory<MockProvider>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        (EthereumContractFactory::new(Arc::new(provider)), mock)
    }

    fn signer() -> Account {
        Account::new(Address::repeat_byte(0x51))
    }

    /// Answers the fee estimation a transaction goes through before gas
    /// estimation. Responses are served last-in first-out, so push this
    /// after the responses to later requests.
    fn push_fee_estimation(mock: &MockProvider) {
        mock.push::<FeeHistory, _>(FeeHistory {
            base_fee_per_gas: vec![],
            gas_used_ratio: vec![],
            oldest_block: U256::zero(),
            reward: vec![],
        })
        .unwrap();
        mock.push::<Block<H256>, _>(Block::<H256> {
            base_fee_per_gas: Some(U256::from(7)),
            ..Default::default()
        })
        .unwrap();
    }

    fn rpc_error(code: i64, message: &str) -> MockResponse {
        MockResponse::Error(JsonRpcError {
            code,
            message: message.to_owned(),
            data: None,
        })
    }

    #[test]
    fn interface_descriptors_parse_into_abis() {
        let registry = interface_abi(&ContractRef::registry(Address::zero())).unwrap();
        assert!(registry.function("projectNumber").is_ok());
        assert!(registry.function("allProjects").is_ok());

        let instance = interface_abi(&ContractRef::instance(Address::zero())).unwrap();
        for name in [
            "sponseredName",
            "sponseredURI",
            "sponsoredAddr",
            "balanceOf",
            "totalSupply",
            "mint",
            "redeem",
        ] {
            assert!(instance.function(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn refuses_to_bind_a_reference_under_the_wrong_role() {
        let (factory, _mock) = factory();
        let registry_ref = ContractRef::registry(Address::repeat_byte(0xaa));
        assert!(factory.build_instance(&registry_ref, signer()).is_err());
        assert!(factory.build_registry(&registry_ref, signer()).is_ok());
    }

    #[tokio::test]
    async fn registry_reads_are_decoded() {
        let (factory, mock) = factory();
        let registry = factory
            .build_registry(&ContractRef::registry(Address::repeat_byte(0xaa)), signer())
            .unwrap();

        mock.push::<Bytes, _>(encoded(&[Token::Uint(U256::from(3))]))
            .unwrap();
        assert_eq!(registry.instance_count().await.unwrap(), 3);

        let entry = Address::repeat_byte(0xbb);
        mock.push::<Bytes, _>(encoded(&[Token::Address(entry)])).unwrap();
        assert_eq!(registry.instance_at(1).await.unwrap(), entry);
    }

    #[tokio::test]
    async fn instance_reads_are_decoded() {
        let (factory, mock) = factory();
        let instance = factory
            .build_instance(&ContractRef::instance(Address::repeat_byte(0xcc)), signer())
            .unwrap();

        mock.push::<Bytes, _>(encoded(&[Token::String("Clean Water".to_owned())]))
            .unwrap();
        assert_eq!(instance.display_name().await.unwrap(), "Clean Water");

        let supply = U256::exp10(18);
        mock.push::<Bytes, _>(encoded(&[Token::Uint(supply)])).unwrap();
        assert_eq!(instance.total_supply().await.unwrap(), supply);
    }

    #[tokio::test]
    async fn submissions_return_the_accepted_hash() {
        let (factory, mock) = factory();
        let instance = factory
            .build_instance(&ContractRef::instance(Address::repeat_byte(0xcc)), signer())
            .unwrap();

        mock.push::<H256, _>(H256::repeat_byte(0xab)).unwrap();
        mock.push::<U256, _>(U256::from(21_000)).unwrap();
        push_fee_estimation(&mock);
        assert_eq!(
            instance.mint(U256::exp10(18)).await.unwrap(),
            H256::repeat_byte(0xab)
        );
    }

    #[tokio::test]
    async fn reverting_submissions_keep_the_node_message() {
        let (factory, mock) = factory();
        let instance = factory
            .build_instance(&ContractRef::instance(Address::repeat_byte(0xcc)), signer())
            .unwrap();

        mock.push_response(rpc_error(3, "execution reverted: redeem exceeds balance"));
        push_fee_estimation(&mock);
        let err = instance.redeem(U256::from(5)).await.unwrap_err();
        assert!(
            matches!(
                err,
                ChainCommunicationError::RpcRejected { code: 3, ref message }
                    if message == "execution reverted: redeem exceeds balance"
            ),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn declined_signatures_are_user_rejections() {
        let (factory, mock) = factory();
        let instance = factory
            .build_instance(&ContractRef::instance(Address::repeat_byte(0xcc)), signer())
            .unwrap();

        mock.push_response(rpc_error(4001, "User denied transaction signature"));
        mock.push::<U256, _>(U256::from(21_000)).unwrap();
        push_fee_estimation(&mock);
        let err = instance.mint(U256::one()).await.unwrap_err();
        assert!(err.is_user_rejection(), "{err:?}");
    }
}
