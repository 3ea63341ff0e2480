use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::channel::oneshot;
use parking_lot::Mutex;

use sponsor_core::*;

/// A signing account derived from a single repeated byte.
pub fn account(byte: u8) -> Account {
    Account::new(Address::repeat_byte(byte))
}

/// A transaction hash derived from a single repeated byte.
pub fn tx_hash(byte: u8) -> H256 {
    H256::repeat_byte(byte)
}

/// A successful confirmation of `hash` in block 1.
pub fn confirmed(hash: H256) -> Confirmation {
    Confirmation {
        hash,
        block_number: Some(1),
        succeeded: true,
    }
}

/// Hands out fixed contract handles and records every account it was asked
/// to bind with.
#[derive(Debug, Default)]
pub struct StaticContractFactory {
    registry: Option<Arc<dyn RegistryContract>>,
    instance: Option<Arc<dyn InstanceContract>>,
    signers: Mutex<Vec<Account>>,
}

impl StaticContractFactory {
    /// A factory that binds every registry reference to `registry`.
    pub fn with_registry(registry: impl RegistryContract + 'static) -> Self {
        Self {
            registry: Some(Arc::new(registry)),
            ..Default::default()
        }
    }

    /// A factory that binds every instance reference to `instance`.
    pub fn with_instance(instance: impl InstanceContract + 'static) -> Self {
        Self {
            instance: Some(Arc::new(instance)),
            ..Default::default()
        }
    }

    /// Accounts used for binding so far, in order.
    pub fn signers(&self) -> Vec<Account> {
        self.signers.lock().clone()
    }
}

impl ContractFactory for StaticContractFactory {
    fn build_registry(
        &self,
        _contract: &ContractRef,
        signer: Account,
    ) -> ChainResult<Arc<dyn RegistryContract>> {
        self.signers.lock().push(signer);
        self.registry
            .clone()
            .ok_or_else(|| ChainCommunicationError::from_other_str("no registry configured"))
    }

    fn build_instance(
        &self,
        _contract: &ContractRef,
        signer: Account,
    ) -> ChainResult<Arc<dyn InstanceContract>> {
        self.signers.lock().push(signer);
        self.instance
            .clone()
            .ok_or_else(|| ChainCommunicationError::from_other_str("no instance configured"))
    }
}

/// A confirmation channel whose watches never resolve.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverConfirms;

#[async_trait]
impl ConfirmationChannel for NeverConfirms {
    async fn once_confirmed(&self, _hash: H256) -> ChainResult<Confirmation> {
        futures::future::pending().await
    }
}

/// A confirmation channel whose watches stay suspended until the test
/// settles them one transaction at a time.
#[derive(Debug, Default)]
pub struct ManualConfirmations {
    waiting: Mutex<HashMap<H256, oneshot::Sender<ChainResult<Confirmation>>>>,
}

impl ManualConfirmations {
    /// Resolve the watch on `hash` with `outcome`. Returns false if nothing
    /// is watching `hash`.
    pub fn settle(&self, hash: H256, outcome: ChainResult<Confirmation>) -> bool {
        match self.waiting.lock().remove(&hash) {
            Some(waiter) => waiter.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Transactions currently being watched.
    pub fn watched(&self) -> usize {
        self.waiting.lock().len()
    }
}

#[async_trait]
impl ConfirmationChannel for ManualConfirmations {
    async fn once_confirmed(&self, hash: H256) -> ChainResult<Confirmation> {
        let (waiter, settled) = oneshot::channel();
        self.waiting.lock().insert(hash, waiter);
        match settled.await {
            Ok(outcome) => outcome,
            Err(_) => futures::future::pending().await,
        }
    }
}

#[cfg(test)]
mod test {
    use futures::FutureExt;

    use super::*;
    use crate::mocks::registry::MockRegistryContract;

    #[test]
    fn static_factory_records_signers() {
        let factory = StaticContractFactory::with_registry(MockRegistryContract::new());
        let registry = ContractRef::registry(Address::zero());
        assert!(factory.build_registry(&registry, account(1)).is_ok());
        assert!(factory.build_instance(&registry, account(2)).is_err());
        assert_eq!(factory.signers(), vec![account(1), account(2)]);
    }

    #[test]
    fn manual_confirmations_settle_only_watched_hashes() {
        let channel = ManualConfirmations::default();
        assert!(!channel.settle(tx_hash(1), Ok(confirmed(tx_hash(1)))));

        let mut watch = channel.once_confirmed(tx_hash(1));
        assert!((&mut watch).now_or_never().is_none());
        assert_eq!(channel.watched(), 1);

        assert!(channel.settle(tx_hash(1), Ok(confirmed(tx_hash(1)))));
        let confirmation = watch.now_or_never().unwrap().unwrap();
        assert_eq!(confirmation.hash, tx_hash(1));
    }
}
