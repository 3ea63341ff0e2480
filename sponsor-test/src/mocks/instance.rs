#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;

use sponsor_core::*;

mock! {
    pub InstanceContract {
        pub fn _address(&self) -> Address;

        pub fn _display_name(&self) -> ChainResult<String>;

        pub fn _reference_uri(&self) -> ChainResult<String>;

        pub fn _beneficiary(&self) -> ChainResult<Address>;

        pub fn _balance_of(&self, account: Address) -> ChainResult<U256>;

        pub fn _total_supply(&self) -> ChainResult<U256>;

        pub fn _mint(&self, value: U256) -> ChainResult<H256>;

        pub fn _redeem(&self, amount: U256) -> ChainResult<H256>;
    }
}

impl std::fmt::Debug for MockInstanceContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockInstanceContract")
    }
}

impl MockInstanceContract {
    /// Expect exactly one read of every display field, answering with the
    /// given values.
    pub fn expect_state(
        &mut self,
        name: &str,
        uri: &str,
        beneficiary: Address,
        balance: U256,
        supply: U256,
    ) {
        let name = name.to_owned();
        let uri = uri.to_owned();
        self.expect__display_name()
            .times(1)
            .returning(move || Ok(name.clone()));
        self.expect__reference_uri()
            .times(1)
            .returning(move || Ok(uri.clone()));
        self.expect__beneficiary()
            .times(1)
            .returning(move || Ok(beneficiary));
        self.expect__balance_of()
            .times(1)
            .returning(move |_| Ok(balance));
        self.expect__total_supply()
            .times(1)
            .returning(move || Ok(supply));
    }
}

impl SponsorContract for MockInstanceContract {
    fn address(&self) -> Address {
        self._address()
    }
}

#[async_trait]
impl InstanceContract for MockInstanceContract {
    async fn display_name(&self) -> ChainResult<String> {
        self._display_name()
    }

    async fn reference_uri(&self) -> ChainResult<String> {
        self._reference_uri()
    }

    async fn beneficiary(&self) -> ChainResult<Address> {
        self._beneficiary()
    }

    async fn balance_of(&self, account: Address) -> ChainResult<U256> {
        self._balance_of(account)
    }

    async fn total_supply(&self) -> ChainResult<U256> {
        self._total_supply()
    }

    async fn mint(&self, value: U256) -> ChainResult<H256> {
        self._mint(value)
    }

    async fn redeem(&self, amount: U256) -> ChainResult<H256> {
        self._redeem(amount)
    }
}
