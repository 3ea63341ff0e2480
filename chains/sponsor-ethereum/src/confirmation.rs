use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::prelude::{JsonRpcClient, PendingTransaction, Provider};
use tracing::{error, info, instrument};

use sponsor_core::{ChainCommunicationError, ChainResult, Confirmation, ConfirmationChannel, H256};

/// Default interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Watches for transaction receipts by polling the node.
#[derive(Debug)]
pub struct EthereumConfirmationChannel<P>
where
    P: JsonRpcClient,
{
    provider: Arc<Provider<P>>,
    poll_interval: Duration,
}

impl<P> EthereumConfirmationChannel<P>
where
    P: JsonRpcClient + 'static,
{
    /// Create a channel polling every `poll_interval`.
    pub fn new(provider: Arc<Provider<P>>, poll_interval: Duration) -> Self {
        Self {
            provider,
            poll_interval,
        }
    }
}

#[async_trait]
impl<P> ConfirmationChannel for EthereumConfirmationChannel<P>
where
    P: JsonRpcClient + 'static,
{
    #[instrument(err, skip(self))]
    async fn once_confirmed(&self, hash: H256) -> ChainResult<Confirmation> {
        info!(tx_hash = ?hash, "Mining transaction");
        let receipt = PendingTransaction::new(hash, &self.provider)
            .interval(self.poll_interval)
            .confirmations(1)
            .await
            .map_err(|err| {
                error!(tx_hash = ?hash, error = ?err, "encountered error when waiting for receipt");
                ChainCommunicationError::from_provider_error(err)
            })?;

        match receipt {
            Some(receipt) => {
                let confirmation = Confirmation {
                    hash,
                    block_number: receipt.block_number.map(|n| n.as_u64()),
                    // pre-byzantium receipts carry no status
                    succeeded: receipt.status.map(|s| s.as_u64() == 1).unwrap_or(true),
                };
                info!(?confirmation, "confirmed transaction");
                Ok(confirmation)
            }
            // ethers-rs will return None if it can no longer poll for the tx in the mempool
            None => Err(ChainCommunicationError::TransactionDropped(hash)),
        }
    }
}
