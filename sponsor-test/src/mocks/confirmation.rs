#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;

use sponsor_core::*;

mock! {
    pub ConfirmationChannel {
        pub fn _once_confirmed(&self, hash: H256) -> ChainResult<Confirmation>;
    }
}

impl std::fmt::Debug for MockConfirmationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockConfirmationChannel")
    }
}

#[async_trait]
impl ConfirmationChannel for MockConfirmationChannel {
    async fn once_confirmed(&self, hash: H256) -> ChainResult<Confirmation> {
        self._once_confirmed(hash)
    }
}
