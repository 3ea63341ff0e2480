#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;

use sponsor_core::*;

mock! {
    pub RegistryContract {
        pub fn _address(&self) -> Address;

        pub fn _instance_count(&self) -> ChainResult<u64>;

        pub fn _instance_at(&self, index: u64) -> ChainResult<Address>;
    }
}

impl std::fmt::Debug for MockRegistryContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockRegistryContract")
    }
}

impl SponsorContract for MockRegistryContract {
    fn address(&self) -> Address {
        self._address()
    }
}

#[async_trait]
impl RegistryContract for MockRegistryContract {
    async fn instance_count(&self) -> ChainResult<u64> {
        self._instance_count()
    }

    async fn instance_at(&self, index: u64) -> ChainResult<Address> {
        self._instance_at(index)
    }
}
