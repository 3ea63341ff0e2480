use ethers::abi::Detokenize;
use ethers::prelude::{Middleware, NameOrAddress};
use ethers_contract::builders::ContractCall;
use tracing::info;

use sponsor_core::{ChainCommunicationError, ChainResult, H256};

/// Dispatches a transaction through `client`, logs the tx id, and returns
/// it. Resolves as soon as the network has accepted the transaction; waiting
/// for inclusion is left to the confirmation channel.
///
/// Refusals keep the node's message verbatim, revert reasons included.
pub(crate) async fn dispatch_tx<M, D>(client: &M, tx: &ContractCall<M, D>) -> ChainResult<H256>
where
    M: Middleware + 'static,
    D: Detokenize,
{
    // "0x..."
    let data = format!(
        "0x{}",
        hex::encode(tx.tx.data().map(|b| b.to_vec()).unwrap_or_default())
    );

    let to = tx
        .tx
        .to()
        .cloned()
        .unwrap_or_else(|| NameOrAddress::Address(Default::default()));

    info!(?to, %data, value = ?tx.tx.value(), "Dispatching transaction");
    let dispatched = client
        .send_transaction(tx.tx.clone(), tx.block)
        .await
        .map_err(ChainCommunicationError::from_middleware_error)?;
    let tx_hash: H256 = *dispatched;

    info!(?to, %data, ?tx_hash, "Dispatched tx");
    Ok(tx_hash)
}
