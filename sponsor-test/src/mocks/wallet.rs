#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;

use sponsor_core::*;

mock! {
    pub Wallet {
        pub fn _request_accounts(&self) -> ChainResult<Vec<Address>>;

        pub fn _current_accounts(&self) -> ChainResult<Vec<Address>>;
    }
}

impl std::fmt::Debug for MockWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockWallet")
    }
}

#[async_trait]
impl WalletCapability for MockWallet {
    async fn request_accounts(&self) -> ChainResult<Vec<Address>> {
        self._request_accounts()
    }

    async fn current_accounts(&self) -> ChainResult<Vec<Address>> {
        self._current_accounts()
    }
}
