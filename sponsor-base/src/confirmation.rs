use std::sync::Arc;
use std::time::Duration;

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use tracing::{info, instrument, warn};

use sponsor_core::{
    Confirmation, ConfirmationChannel, PendingTransaction, SponsorError, SponsorResult, H256,
};

/// Watches pending transactions until their first confirmation.
#[derive(Debug, Clone)]
pub struct ConfirmationTracker {
    channel: Arc<dyn ConfirmationChannel>,
    deadline: Option<Duration>,
}

impl ConfirmationTracker {
    /// Create a tracker. Without a deadline a watch waits until the channel
    /// resolves or the watch is cancelled.
    pub fn new(channel: Arc<dyn ConfirmationChannel>, deadline: Option<Duration>) -> Self {
        Self { channel, deadline }
    }

    /// Start watching `pending`. Nothing is polled until
    /// [`ConfirmationWatch::wait`] is awaited.
    pub fn watch(&self, pending: &PendingTransaction) -> ConfirmationWatch {
        let (abort_handle, registration) = AbortHandle::new_pair();
        ConfirmationWatch {
            hash: pending.hash,
            channel: self.channel.clone(),
            deadline: self.deadline,
            abort_handle,
            registration,
        }
    }

    /// Wait for the first confirmation of `pending`.
    pub async fn await_confirmation(
        &self,
        pending: &PendingTransaction,
    ) -> SponsorResult<Confirmation> {
        self.watch(pending).wait().await
    }
}

/// A single confirmation watch. Cancel it from elsewhere through
/// [`ConfirmationWatch::cancel_handle`].
#[derive(Debug)]
pub struct ConfirmationWatch {
    hash: H256,
    channel: Arc<dyn ConfirmationChannel>,
    deadline: Option<Duration>,
    abort_handle: AbortHandle,
    registration: AbortRegistration,
}

impl ConfirmationWatch {
    /// The watched transaction.
    pub fn hash(&self) -> H256 {
        self.hash
    }

    /// A handle that stops this watch when aborted.
    pub fn cancel_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Resolve the watch. A channel failure is reported as lost tracking
    /// rather than as a failed transaction, since the transaction may still
    /// confirm.
    #[instrument(skip(self), fields(tx_hash = ?self.hash))]
    pub async fn wait(self) -> SponsorResult<Confirmation> {
        let hash = self.hash;
        let channel = self.channel;
        let watch = Abortable::new(
            async move { channel.once_confirmed(hash).await },
            self.registration,
        );

        let outcome = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, watch).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(?deadline, "No confirmation before the deadline");
                    return Err(SponsorError::TimedOut { hash });
                }
            },
            None => watch.await,
        };

        match outcome {
            Ok(Ok(confirmation)) => {
                info!(
                    block_number = ?confirmation.block_number,
                    succeeded = confirmation.succeeded,
                    "Transaction confirmed"
                );
                Ok(confirmation)
            }
            Ok(Err(err)) => {
                warn!(error = %err, "Lost track of transaction");
                Err(SponsorError::TrackingLost {
                    hash,
                    reason: err.to_string(),
                })
            }
            Err(_aborted) => {
                info!("Stopped watching transaction");
                Err(SponsorError::Aborted { hash })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use sponsor_core::{Address, ChainCommunicationError, InstanceCall, U256};
    use sponsor_test::mocks::confirmation::MockConfirmationChannel;
    use sponsor_test::test_utils::{confirmed, tx_hash, NeverConfirms};

    use super::*;

    fn pending(byte: u8) -> PendingTransaction {
        PendingTransaction::new(
            tx_hash(byte),
            Address::repeat_byte(0xcc),
            InstanceCall::Mint {
                value: U256::one(),
            },
        )
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn resolves_on_first_confirmation() {
        let mut channel = MockConfirmationChannel::new();
        channel
            .expect__once_confirmed()
            .withf(|hash| *hash == tx_hash(1))
            .times(1)
            .returning(|hash| Ok(confirmed(hash)));
        let tracker = ConfirmationTracker::new(Arc::new(channel), None);

        let confirmation = tracker.await_confirmation(&pending(1)).await.unwrap();
        assert!(confirmation.succeeded);
        assert!(logs_contain("Transaction confirmed"));
    }

    #[tokio::test]
    async fn channel_failure_loses_tracking() {
        let mut channel = MockConfirmationChannel::new();
        channel
            .expect__once_confirmed()
            .returning(|hash| Err(ChainCommunicationError::TransactionDropped(hash)));
        let tracker = ConfirmationTracker::new(Arc::new(channel), None);

        let err = tracker.await_confirmation(&pending(2)).await.unwrap_err();
        assert!(matches!(err, SponsorError::TrackingLost { hash, .. } if hash == tx_hash(2)));
    }

    #[tokio::test]
    async fn cancelled_watches_abort() {
        let tracker = ConfirmationTracker::new(Arc::new(NeverConfirms), None);
        let watch = tracker.watch(&pending(3));
        let cancel = watch.cancel_handle();

        let waiting = tokio::spawn(watch.wait());
        cancel.abort();
        let err = waiting.await.unwrap().unwrap_err();
        assert!(matches!(err, SponsorError::Aborted { hash } if hash == tx_hash(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_times_the_watch_out() {
        let tracker =
            ConfirmationTracker::new(Arc::new(NeverConfirms), Some(Duration::from_secs(30)));

        let err = tracker.await_confirmation(&pending(4)).await.unwrap_err();
        assert!(matches!(err, SponsorError::TimedOut { hash } if hash == tx_hash(4)));
    }
}
