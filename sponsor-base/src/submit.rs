use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, instrument, warn};

use sponsor_core::{
    Address, ChainCommunicationError, InstanceCall, MethodKind, PendingTransaction, SponsorError,
    SponsorResult,
};

use crate::ContractHandle;

type InFlightKey = (Address, InstanceCall);

/// Submissions that have been sent but not yet resolved, keyed by target
/// contract, method and argument.
#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    keys: Arc<Mutex<HashSet<InFlightKey>>>,
}

impl InFlightSet {
    /// Claim `call` on `contract`. Fails if an identical submission is
    /// already in flight.
    pub fn try_acquire(&self, contract: Address, call: InstanceCall) -> SponsorResult<InFlightGuard> {
        let key = (contract, call);
        if !self.keys.lock().insert(key) {
            return Err(SponsorError::DuplicateSubmission {
                method: call.method().to_owned(),
            });
        }
        Ok(InFlightGuard {
            keys: self.keys.clone(),
            key,
        })
    }

    /// True if `call` on `contract` is currently claimed.
    pub fn contains(&self, contract: Address, call: &InstanceCall) -> bool {
        self.keys.lock().contains(&(contract, *call))
    }
}

/// Releases its in-flight claim when dropped.
#[derive(Debug)]
#[must_use = "the submission is released as soon as the guard is dropped"]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<InFlightKey>>>,
    key: InFlightKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys.lock().remove(&self.key);
    }
}

/// Sends state-changing calls through a bound instance handle.
#[derive(Debug, Clone, Default)]
pub struct TransactionSubmitter {
    in_flight: InFlightSet,
}

impl TransactionSubmitter {
    /// Submissions currently claimed through [`Self::submit_exclusive`].
    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }

    /// Send `call` and return once the network has accepted it. Nothing is
    /// sent if the bound interface does not declare the method as
    /// state-changing.
    #[instrument(skip(self, handle), fields(instance = ?handle.contract().address(), %call))]
    pub async fn submit(
        &self,
        handle: &ContractHandle,
        call: InstanceCall,
    ) -> SponsorResult<PendingTransaction> {
        let contract = handle.contract();
        let unsupported = || SponsorError::UnsupportedMethod {
            method: call.method().to_owned(),
            role: contract.role(),
        };
        let descriptor = contract
            .interface()
            .method(call.method())
            .ok_or_else(unsupported)?;
        match (descriptor.kind, call) {
            (MethodKind::StateChanging { payable: true }, InstanceCall::Mint { .. })
            | (MethodKind::StateChanging { payable: false }, InstanceCall::Redeem { .. }) => {}
            _ => return Err(unsupported()),
        }
        let instance = handle.instance()?;

        let sent = match call {
            InstanceCall::Mint { value } => instance.mint(value).await,
            InstanceCall::Redeem { amount } => instance.redeem(amount).await,
        };
        match sent {
            Ok(hash) => {
                info!(tx_hash = ?hash, "Transaction accepted by the network");
                Ok(PendingTransaction::new(hash, contract.address(), call))
            }
            Err(err) if err.is_user_rejection() => {
                warn!(error = %err, "Signing declined in wallet");
                Err(SponsorError::AuthorizationDenied)
            }
            Err(err) => {
                warn!(error = %err, "Transaction rejected");
                Err(SponsorError::SubmissionRejected {
                    reason: rejection_reason(err),
                })
            }
        }
    }

    /// Like [`Self::submit`], but refuses to send while an identical call on
    /// the same contract is in flight. The returned guard keeps the claim
    /// alive; drop it once the transaction is resolved.
    pub async fn submit_exclusive(
        &self,
        handle: &ContractHandle,
        call: InstanceCall,
    ) -> SponsorResult<(PendingTransaction, InFlightGuard)> {
        let guard = self
            .in_flight
            .try_acquire(handle.contract().address(), call)?;
        let pending = self.submit(handle, call).await?;
        Ok((pending, guard))
    }
}

fn rejection_reason(err: ChainCommunicationError) -> String {
    match err {
        ChainCommunicationError::RpcRejected { message, .. } => message,
        other => other.to_string(),
    }
}
