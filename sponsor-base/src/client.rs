use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use derive_new::new;
use futures::future::AbortHandle;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use sponsor_core::{
    Account, Address, ConfirmationChannel, ContractFactory, ContractRef, InstanceCall,
    InstanceListEntry, InstanceState, SponsorError, SponsorResult, TxLifecycle,
    WalletCapability, H256,
};

use crate::{
    ConfirmationTracker, ContractBinding, ContractHandle, InstanceReader, InstanceTarget,
    RegistryReader, TransactionSubmitter, WalletConnector,
};

/// The capabilities one wallet endpoint provides.
#[derive(Debug, Clone, new)]
pub struct WalletBackend {
    wallet: Arc<dyn WalletCapability>,
    factory: Arc<dyn ContractFactory>,
    channel: Arc<dyn ConfirmationChannel>,
}

/// What the status line shows for the most recent transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TxStatus {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Accepted by the network, waiting for confirmation
    Pending(H256),
    /// Confirmed
    Confirmed(H256),
    /// The action failed; the message is meant for the user
    Failed(String),
}

impl TxStatus {
    /// The status a transaction at `lifecycle` shows. An aborted watch has
    /// none of its own; the failure that aborted it is reported instead.
    pub fn tracking(hash: H256, lifecycle: TxLifecycle) -> Option<Self> {
        match lifecycle {
            TxLifecycle::Submitted => Some(Self::Pending(hash)),
            TxLifecycle::Confirmed => Some(Self::Confirmed(hash)),
            TxLifecycle::Aborted => None,
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => Ok(()),
            Self::Pending(hash) => write!(f, "Pending {hash:?}"),
            Self::Confirmed(hash) => write!(f, "Confirmed {hash:?}"),
            Self::Failed(message) => f.write_str(message),
        }
    }
}

/// The user-facing actions of the tool. Every action reports its own
/// outcome; a failed action leaves the client usable for the next one.
#[derive(Debug)]
pub struct SponsorClient {
    connector: Arc<WalletConnector>,
    binding: ContractBinding,
    tracker: Option<ConfirmationTracker>,
    submitter: TransactionSubmitter,
    registry: ContractRef,
    status: watch::Sender<TxStatus>,
    watches: Mutex<HashMap<H256, AbortHandle>>,
}

impl SponsorClient {
    /// Create a client for the registry at `registry`. Without a backend,
    /// every action needing an account reports that no wallet is available.
    pub fn new(backend: Option<WalletBackend>, registry: Address, deadline: Option<Duration>) -> Self {
        let (wallet, factory, tracker) = match backend {
            Some(backend) => (
                Some(backend.wallet),
                Some(backend.factory),
                Some(ConfirmationTracker::new(backend.channel, deadline)),
            ),
            None => (None, None, None),
        };
        let connector = Arc::new(WalletConnector::new(wallet));
        let (status, _) = watch::channel(TxStatus::Idle);
        Self {
            binding: ContractBinding::new(connector.clone(), factory),
            connector,
            tracker,
            submitter: TransactionSubmitter::default(),
            registry: ContractRef::registry(registry),
            status,
            watches: Mutex::default(),
        }
    }

    /// The wallet connector.
    pub fn connector(&self) -> &Arc<WalletConnector> {
        &self.connector
    }

    /// Observe transaction status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<TxStatus> {
        self.status.subscribe()
    }

    /// The latest transaction status.
    pub fn status(&self) -> TxStatus {
        self.status.borrow().clone()
    }

    /// Request account authorization from the wallet.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> SponsorResult<Account> {
        report(self.connector.connect().await)
    }

    /// List every registered instance in index order.
    #[instrument(skip(self), fields(registry = ?self.registry.address()))]
    pub async fn list_instances(&self) -> SponsorResult<Vec<InstanceListEntry>> {
        let result = async {
            let handle = self.binding.bind(&self.registry)?;
            RegistryReader::new(&handle)?.list_all().await
        }
        .await;
        report(result)
    }

    /// Read the state of one instance as seen by the connected account.
    #[instrument(skip(self), fields(instance = %target))]
    pub async fn show_instance(&self, target: &InstanceTarget) -> SponsorResult<InstanceState> {
        let result = async {
            let handle = self.binding.bind(&target.contract_ref())?;
            InstanceReader::new(&handle)?.read().await
        }
        .await;
        report(result)
    }

    /// Deposit `amount` (in asset units) into an instance and return its
    /// state once the transaction is confirmed.
    #[instrument(skip(self), fields(instance = %target))]
    pub async fn mint(&self, target: &InstanceTarget, amount: &str) -> SponsorResult<InstanceState> {
        let result = match InstanceCall::mint_from_input(amount) {
            Ok(call) => self.transact(target, call).await,
            Err(err) => Err(err),
        };
        self.finish(result)
    }

    /// Redeem `amount` claims (in asset units) from an instance and return
    /// its state once the transaction is confirmed.
    #[instrument(skip(self), fields(instance = %target))]
    pub async fn redeem(
        &self,
        target: &InstanceTarget,
        amount: &str,
    ) -> SponsorResult<InstanceState> {
        let result = match InstanceCall::redeem_from_input(amount) {
            Ok(call) => self.transact(target, call).await,
            Err(err) => Err(err),
        };
        self.finish(result)
    }

    /// Stop waiting for every transaction currently being watched. The
    /// transactions themselves are unaffected. Returns false if nothing was
    /// being watched.
    pub fn cancel_pending(&self) -> bool {
        let watches = self.watches.lock();
        for handle in watches.values() {
            handle.abort();
        }
        !watches.is_empty()
    }

    /// Transactions whose confirmation is currently being awaited.
    pub fn watching(&self) -> Vec<H256> {
        self.watches.lock().keys().copied().collect()
    }

    async fn transact(
        &self,
        target: &InstanceTarget,
        call: InstanceCall,
    ) -> SponsorResult<InstanceState> {
        let tracker = self.tracker.as_ref().ok_or(SponsorError::WalletUnavailable)?;
        let handle = self.binding.bind(&target.contract_ref())?;
        let (pending, guard) = self.submitter.submit_exclusive(&handle, call).await?;
        let hash = pending.hash;

        // Registered before Pending is published, so a subscriber reacting to
        // Pending can always cancel the watch.
        let watch = tracker.watch(&pending);
        self.watches.lock().insert(hash, watch.cancel_handle());
        let mut lifecycle = TxLifecycle::Submitted;
        if let Some(status) = TxStatus::tracking(hash, lifecycle) {
            self.status.send_replace(status);
        }

        let outcome = watch.wait().await;
        self.watches.lock().remove(&hash);
        drop(guard);

        lifecycle = lifecycle.resolve(outcome.is_ok());
        debug!(tx_hash = ?hash, ?lifecycle, "Transaction resolved");
        let confirmation = outcome?;
        if !confirmation.succeeded {
            return Err(SponsorError::Reverted { hash });
        }
        if let Some(status) = TxStatus::tracking(hash, lifecycle) {
            self.publish(Some(hash), status);
        }
        info!(tx_hash = ?hash, "Transaction confirmed");

        self.reread(&handle).await
    }

    async fn reread(&self, handle: &ContractHandle) -> SponsorResult<InstanceState> {
        let handle = if handle.is_stale(&self.connector) {
            self.binding.bind(handle.contract())?
        } else {
            handle.clone()
        };
        InstanceReader::new(&handle)?.read().await
    }

    fn finish(&self, result: SponsorResult<InstanceState>) -> SponsorResult<InstanceState> {
        match &result {
            // The state shown belongs to the confirmed transaction, and a
            // duplicate must not clobber the status of the one in flight.
            Ok(_) | Err(SponsorError::DuplicateSubmission { .. }) => {}
            Err(SponsorError::ReadFailed { .. })
                if matches!(*self.status.borrow(), TxStatus::Confirmed(_)) => {}
            Err(err) => self.publish(err.transaction(), TxStatus::Failed(err.status_message())),
        }
        report(result)
    }

    /// Publish the outcome of an action concerning `owner`. The pending
    /// status of another transaction still being watched is left in place.
    fn publish(&self, owner: Option<H256>, next: TxStatus) {
        self.status.send_if_modified(|current| {
            if let TxStatus::Pending(hash) = current {
                if Some(*hash) != owner && self.watches.lock().contains_key(hash) {
                    return false;
                }
            }
            *current = next;
            true
        });
    }
}

fn report<T>(result: SponsorResult<T>) -> SponsorResult<T> {
    if let Err(err) = &result {
        warn!(error = %err, status = %err.status_message(), "Action failed");
    }
    result
}

#[cfg(test)]
mod test {
    use sponsor_core::{ChainCommunicationError, Confirmation, U256};
    use sponsor_test::mocks::{
        confirmation::MockConfirmationChannel, instance::MockInstanceContract,
        registry::MockRegistryContract, wallet::MockWallet,
    };
    use sponsor_test::test_utils::{
        account, confirmed, tx_hash, ManualConfirmations, NeverConfirms, StaticContractFactory,
    };

    use super::*;

    const INSTANCE: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

    fn target() -> InstanceTarget {
        InstanceTarget::parse(INSTANCE).unwrap()
    }

    fn authorizing_wallet() -> MockWallet {
        let mut wallet = MockWallet::new();
        wallet
            .expect__request_accounts()
            .returning(|| Ok(vec![Address::repeat_byte(1)]));
        wallet
    }

    fn client(
        factory: StaticContractFactory,
        channel: impl ConfirmationChannel + 'static,
        deadline: Option<Duration>,
    ) -> SponsorClient {
        let backend = WalletBackend::new(
            Arc::new(authorizing_wallet()),
            Arc::new(factory),
            Arc::new(channel),
        );
        SponsorClient::new(Some(backend), Address::repeat_byte(0xee), deadline)
    }

    fn confirming_channel() -> MockConfirmationChannel {
        let mut channel = MockConfirmationChannel::new();
        channel
            .expect__once_confirmed()
            .returning(|hash| Ok(confirmed(hash)));
        channel
    }

    /// An instance whose balance and supply grow with a single mint of
    /// `expected` base units.
    fn growing_instance(expected: U256) -> MockInstanceContract {
        let minted = Arc::new(Mutex::new(U256::zero()));
        let mut instance = MockInstanceContract::new();
        instance
            .expect__address()
            .returning(|| Address::repeat_byte(0xcc));
        instance
            .expect__display_name()
            .returning(|| Ok("Clean Water".into()));
        instance
            .expect__reference_uri()
            .returning(|| Ok("https://example.org/water".into()));
        instance
            .expect__beneficiary()
            .returning(|| Ok(Address::repeat_byte(0xbe)));
        let balance = minted.clone();
        instance
            .expect__balance_of()
            .returning(move |_| Ok(*balance.lock()));
        let supply = minted.clone();
        instance
            .expect__total_supply()
            .returning(move || Ok(U256::exp10(18) + *supply.lock()));
        instance
            .expect__mint()
            .withf(move |value| *value == expected)
            .times(1)
            .returning(move |value| {
                *minted.lock() += value;
                Ok(tx_hash(0xb0))
            });
        instance
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn lists_the_registry_in_index_order() {
        let mut registry = MockRegistryContract::new();
        registry.expect__instance_count().returning(|| Ok(3));
        registry
            .expect__instance_at()
            .returning(|index| Ok(Address::repeat_byte([0xaa, 0xbb, 0xcc][index as usize])));
        let client = client(
            StaticContractFactory::with_registry(registry),
            NeverConfirms,
            None,
        );

        client.connect().await.unwrap();
        let entries = client.list_instances().await.unwrap();
        assert_eq!(
            entries,
            vec![
                InstanceListEntry {
                    index: 0,
                    address: Address::repeat_byte(0xaa)
                },
                InstanceListEntry {
                    index: 1,
                    address: Address::repeat_byte(0xbb)
                },
                InstanceListEntry {
                    index: 2,
                    address: Address::repeat_byte(0xcc)
                },
            ]
        );
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn minting_half_a_unit_grows_balance_and_supply() {
        let half = U256::from_dec_str("500000000000000000").unwrap();
        let client = client(
            StaticContractFactory::with_instance(growing_instance(half)),
            confirming_channel(),
            None,
        );

        client.connect().await.unwrap();
        let before = client.show_instance(&target()).await.unwrap();
        let after = client.mint(&target(), "0.5").await.unwrap();

        assert_eq!(after.caller_balance(), before.caller_balance() + half);
        assert_eq!(after.total_supply(), before.total_supply() + half);
        assert_eq!(client.status(), TxStatus::Confirmed(tx_hash(0xb0)));
        assert!(logs_contain("Transaction confirmed"));
    }

    #[tokio::test]
    async fn without_a_wallet_every_action_asks_for_one() {
        let client = SponsorClient::new(None, Address::repeat_byte(0xee), None);

        assert!(matches!(
            client.connect().await,
            Err(SponsorError::WalletUnavailable)
        ));
        assert!(matches!(
            client.list_instances().await,
            Err(SponsorError::WalletUnavailable)
        ));
        let err = client.mint(&target(), "1").await.unwrap_err();
        assert_eq!(err.status_message(), "Please install a wallet");
        assert_eq!(
            client.status(),
            TxStatus::Failed("Please install a wallet".to_owned())
        );
    }

    #[tokio::test]
    async fn declined_authorization_keeps_the_client_disconnected() {
        let mut wallet = MockWallet::new();
        wallet
            .expect__request_accounts()
            .times(1)
            .returning(|| Err(ChainCommunicationError::from_rpc_error(4001, "User rejected")));
        let backend = WalletBackend::new(
            Arc::new(wallet),
            Arc::new(StaticContractFactory::default()),
            Arc::new(NeverConfirms),
        );
        let client = SponsorClient::new(Some(backend), Address::repeat_byte(0xee), None);

        assert!(matches!(
            client.connect().await,
            Err(SponsorError::AuthorizationDenied)
        ));
        assert_eq!(client.connector().current_account(), None);
    }

    #[tokio::test]
    async fn negative_amounts_never_reach_the_network() {
        let mut instance = MockInstanceContract::new();
        instance.expect__redeem().never();
        let client = client(
            StaticContractFactory::with_instance(instance),
            NeverConfirms,
            None,
        );
        client.connect().await.unwrap();

        let err = client.redeem(&target(), "-5").await.unwrap_err();
        assert!(matches!(err, SponsorError::InvalidAmount { .. }));
        assert_eq!(client.status(), TxStatus::Failed("Invalid amount: -5".to_owned()));
    }

    #[tokio::test]
    async fn reverted_transactions_fail_the_action() {
        let mut instance = MockInstanceContract::new();
        instance
            .expect__redeem()
            .times(1)
            .returning(|_| Ok(tx_hash(0xd0)));
        let mut channel = MockConfirmationChannel::new();
        channel.expect__once_confirmed().returning(|hash| {
            Ok(Confirmation {
                hash,
                block_number: Some(10),
                succeeded: false,
            })
        });
        let client = client(StaticContractFactory::with_instance(instance), channel, None);
        client.connect().await.unwrap();

        let err = client.redeem(&target(), "1").await.unwrap_err();
        assert!(matches!(err, SponsorError::Reverted { hash } if hash == tx_hash(0xd0)));
        assert!(matches!(client.status(), TxStatus::Failed(_)));
    }

    #[tokio::test]
    async fn duplicates_are_refused_and_watches_can_be_cancelled() {
        let mut instance = MockInstanceContract::new();
        instance
            .expect__mint()
            .times(1)
            .returning(|_| Ok(tx_hash(0xe0)));
        let client = client(
            StaticContractFactory::with_instance(instance),
            NeverConfirms,
            None,
        );
        client.connect().await.unwrap();
        let mut status = client.subscribe_status();
        let target = target();

        let (first, second) = tokio::join!(client.mint(&target, "2"), async {
            status
                .wait_for(|s| matches!(s, TxStatus::Pending(_)))
                .await
                .unwrap();
            let second = client.mint(&target, "2").await;
            assert!(client.cancel_pending());
            second
        });

        assert!(matches!(
            second,
            Err(SponsorError::DuplicateSubmission { .. })
        ));
        assert!(matches!(first, Err(SponsorError::Aborted { hash }) if hash == tx_hash(0xe0)));
        assert!(!client.cancel_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn deadlines_leave_the_transaction_to_be_checked_manually() {
        let mut instance = MockInstanceContract::new();
        instance
            .expect__mint()
            .times(1)
            .returning(|_| Ok(tx_hash(0xf0)));
        let client = client(
            StaticContractFactory::with_instance(instance),
            NeverConfirms,
            Some(Duration::from_secs(60)),
        );
        client.connect().await.unwrap();

        let err = client.mint(&target(), "1").await.unwrap_err();
        assert!(matches!(err, SponsorError::TimedOut { .. }));
        assert!(matches!(client.status(), TxStatus::Failed(ref msg) if msg.starts_with("Still pending")));
    }

    #[tokio::test]
    async fn lost_tracking_is_reported_as_unknown_status() {
        let mut instance = MockInstanceContract::new();
        instance
            .expect__mint()
            .times(1)
            .returning(|_| Ok(tx_hash(0x11)));
        let mut channel = MockConfirmationChannel::new();
        channel
            .expect__once_confirmed()
            .returning(|_| Err(ChainCommunicationError::from_other_str("socket closed")));
        let client = client(StaticContractFactory::with_instance(instance), channel, None);
        client.connect().await.unwrap();

        let err = client.mint(&target(), "1").await.unwrap_err();
        assert!(err.status_message().starts_with("Status unknown"));
        assert_eq!(client.connector().current_account(), Some(account(1)));
    }

    #[tokio::test]
    async fn zero_amounts_never_reach_the_network() {
        let mut instance = MockInstanceContract::new();
        instance.expect__mint().never();
        let client = client(
            StaticContractFactory::with_instance(instance),
            NeverConfirms,
            None,
        );
        client.connect().await.unwrap();

        let err = client.mint(&target(), "0").await.unwrap_err();
        assert!(matches!(err, SponsorError::InvalidAmount { ref input, .. } if input == "0"));
        assert_eq!(client.status(), TxStatus::Failed("Invalid amount: 0".to_owned()));
    }

    #[tokio::test]
    async fn concurrent_watches_are_cancelled_independently() {
        let one = U256::exp10(18);
        let mut instance = MockInstanceContract::new();
        instance
            .expect__mint()
            .times(2)
            .returning(move |value| Ok(tx_hash(if value == one { 0x01 } else { 0x02 })));
        let channel = Arc::new(ManualConfirmations::default());
        let client = client(
            StaticContractFactory::with_instance(instance),
            channel.clone(),
            None,
        );
        client.connect().await.unwrap();
        let mut status = client.subscribe_status();
        let target = target();

        let (first, second, ()) = tokio::join!(
            client.mint(&target, "1"),
            client.mint(&target, "2"),
            async {
                status
                    .wait_for(|_| client.watching().len() == 2)
                    .await
                    .unwrap();
                assert!(channel.settle(
                    tx_hash(0x01),
                    Err(ChainCommunicationError::from_other_str("socket closed"))
                ));
                while client.watching().len() > 1 {
                    tokio::task::yield_now().await;
                }

                assert_eq!(client.watching(), vec![tx_hash(0x02)]);
                assert_eq!(client.status(), TxStatus::Pending(tx_hash(0x02)));
                assert!(client.cancel_pending());
            }
        );

        assert!(matches!(first, Err(SponsorError::TrackingLost { hash, .. }) if hash == tx_hash(0x01)));
        assert!(matches!(second, Err(SponsorError::Aborted { hash }) if hash == tx_hash(0x02)));
        assert!(client.watching().is_empty());
        assert!(!client.cancel_pending());
        assert_eq!(
            client.status(),
            TxStatus::Failed(SponsorError::Aborted { hash: tx_hash(0x02) }.status_message())
        );
    }

    #[test]
    fn status_follows_the_transaction_lifecycle() {
        let hash = tx_hash(0x22);
        assert_eq!(
            TxStatus::tracking(hash, TxLifecycle::Submitted),
            Some(TxStatus::Pending(hash))
        );
        assert_eq!(
            TxStatus::tracking(hash, TxLifecycle::Submitted.resolve(true)),
            Some(TxStatus::Confirmed(hash))
        );
        assert_eq!(
            TxStatus::tracking(hash, TxLifecycle::Submitted.resolve(false)),
            None
        );
    }
}
