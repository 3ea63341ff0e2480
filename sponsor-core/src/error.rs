use std::any::Any;
use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

use ethers_contract::ContractError;
use ethers_core::abi::AbiError;
use ethers_providers::{Middleware, MiddlewareError, ProviderError, RpcError};

use crate::{AmountError, ContractRole, ReadTarget, H256};

/// EIP-1193 error code returned when the user rejects a wallet request.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// The result of interacting with a chain.
pub type ChainResult<T> = Result<T, ChainCommunicationError>;

/// The result of a client operation.
pub type SponsorResult<T> = Result<T, SponsorError>;

/// An "Any"-typed error.
pub trait SponsorCustomError: StdError + Send + Sync + Any {}

impl<E: StdError + Send + Sync + Any> SponsorCustomError for E {}

/// Thin wrapper around a boxed SponsorCustomError; a trait-object adaptor.
#[repr(transparent)]
pub struct SponsorCustomErrorWrapper(Box<dyn SponsorCustomError>);

impl Debug for SponsorCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", AsRef::<dyn SponsorCustomError>::as_ref(&self))
    }
}

impl Display for SponsorCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", AsRef::<dyn SponsorCustomError>::as_ref(&self))
    }
}

impl StdError for SponsorCustomErrorWrapper {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl AsRef<dyn SponsorCustomError> for SponsorCustomErrorWrapper {
    fn as_ref(&self) -> &dyn SponsorCustomError {
        self.0.as_ref()
    }
}

impl Deref for SponsorCustomErrorWrapper {
    type Target = Box<dyn SponsorCustomError>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
#[repr(transparent)]
struct StringError(String);

impl Display for StringError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for StringError {}

/// ChainCommunicationError contains errors returned when attempting to
/// call a chain, talk to the wallet or dispatch a transaction
#[derive(Debug, thiserror::Error)]
pub enum ChainCommunicationError {
    /// An error with a contract call
    #[error(transparent)]
    ContractError(SponsorCustomErrorWrapper),
    /// Provider Error
    #[error(transparent)]
    ProviderError(#[from] ProviderError),
    /// The wallet user declined the request
    #[error("User rejected the request: {0}")]
    UserRejected(String),
    /// The node or wallet answered the request with a JSON-RPC error object
    #[error("{message} (code {code})")]
    RpcRejected {
        /// JSON-RPC error code
        code: i64,
        /// Error message as returned by the node
        message: String,
    },
    /// A transaction was dropped from the mempool
    #[error("Transaction dropped from mempool {0:?}")]
    TransactionDropped(H256),
    /// Any other error; does not implement `From` to prevent
    /// conflicting/absorbing other errors.
    #[error(transparent)]
    Other(SponsorCustomErrorWrapper),
}

impl ChainCommunicationError {
    /// Create a chain communication error from any other existing error
    pub fn from_other<E: SponsorCustomError>(err: E) -> Self {
        Self::Other(SponsorCustomErrorWrapper(Box::new(err)))
    }

    /// Creates a chain communication error of the other error variant from a string
    pub fn from_other_str(err: impl Into<String>) -> Self {
        Self::from_other(StringError(err.into()))
    }

    /// Creates a chain communication error of the contract error variant from any other existing
    /// error
    pub fn from_contract_error<E>(err: E) -> Self
    where
        E: SponsorCustomError,
    {
        Self::ContractError(SponsorCustomErrorWrapper(Box::new(err)))
    }

    /// Classify a JSON-RPC error object. User rejections get their own
    /// variant so callers can tell them apart from node refusals.
    pub fn from_rpc_error(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        if code == USER_REJECTED_REQUEST {
            Self::UserRejected(message)
        } else {
            Self::RpcRejected { code, message }
        }
    }

    /// Classify a provider error, lifting JSON-RPC error objects out of the
    /// transport error.
    pub fn from_provider_error(err: ProviderError) -> Self {
        match RpcError::as_error_response(&err) {
            Some(resp) => Self::from_rpc_error(resp.code, resp.message.clone()),
            None => Self::ProviderError(err),
        }
    }

    /// Classify the error of a middleware request. The node's message is
    /// kept verbatim, including any revert reason it carries.
    pub fn from_middleware_error<E>(err: E) -> Self
    where
        E: MiddlewareError + 'static,
    {
        match err.as_error_response() {
            Some(resp) => Self::from_rpc_error(resp.code, resp.message.clone()),
            None => Self::from_contract_error(err),
        }
    }

    /// True if the user declined the request in their wallet.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::UserRejected(_))
    }

    /// True if the remote side answered with an error object, as opposed to
    /// the request never reaching it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::UserRejected(_) | Self::RpcRejected { .. })
    }
}

impl<M> From<ContractError<M>> for ChainCommunicationError
where
    M: Middleware + 'static,
{
    fn from(e: ContractError<M>) -> Self {
        let response = e
            .as_middleware_error()
            .and_then(MiddlewareError::as_error_response)
            .or_else(|| {
                e.as_provider_error()
                    .and_then(|inner| RpcError::as_error_response(inner))
            });
        if let Some(resp) = response {
            return Self::from_rpc_error(resp.code, resp.message.clone());
        }
        if e.is_revert() {
            let message = match e.decode_revert::<String>() {
                Some(reason) => format!("execution reverted: {reason}"),
                None => "execution reverted".to_owned(),
            };
            return Self::RpcRejected { code: 3, message };
        }
        Self::ContractError(SponsorCustomErrorWrapper(Box::new(e)))
    }
}

impl From<AbiError> for ChainCommunicationError {
    fn from(e: AbiError) -> Self {
        Self::from_contract_error(e)
    }
}

/// The outcome taxonomy of a single user action. Every variant is scoped to
/// the action that produced it; none is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum SponsorError {
    /// No wallet capability is present or reachable
    #[error("No wallet capability available")]
    WalletUnavailable,
    /// The user declined an authorization or signing request
    #[error("Authorization denied by the wallet")]
    AuthorizationDenied,
    /// A data read failed
    #[error("Failed to read {target}: {source}")]
    ReadFailed {
        /// What was being read
        target: ReadTarget,
        /// Underlying failure
        #[source]
        source: ChainCommunicationError,
    },
    /// User-entered amount could not be converted to base units
    #[error("Invalid amount {input:?}: {source}")]
    InvalidAmount {
        /// The raw input
        input: String,
        /// Why it was rejected
        #[source]
        source: AmountError,
    },
    /// The method is not a state-changing entry of the bound interface
    #[error("Method `{method}` is not a state-changing entry of the {role} interface")]
    UnsupportedMethod {
        /// Requested method
        method: String,
        /// Role of the bound contract
        role: ContractRole,
    },
    /// The network or contract rejected the call before confirmation
    #[error("Transaction rejected: {reason}")]
    SubmissionRejected {
        /// The reason, verbatim from the node
        reason: String,
    },
    /// An identical submission is already in flight
    #[error("An identical `{method}` submission is already in flight")]
    DuplicateSubmission {
        /// Method of the in-flight submission
        method: String,
    },
    /// The confirmation channel failed after submission
    #[error("Lost track of transaction {hash:?}: {reason}")]
    TrackingLost {
        /// Submitted transaction
        hash: H256,
        /// Underlying failure
        reason: String,
    },
    /// The transaction was mined but reverted
    #[error("Transaction {hash:?} reverted")]
    Reverted {
        /// Submitted transaction
        hash: H256,
    },
    /// No confirmation arrived before the configured deadline
    #[error("Timed out waiting for transaction {hash:?}")]
    TimedOut {
        /// Submitted transaction
        hash: H256,
    },
    /// The confirmation watch was cancelled
    #[error("Stopped waiting for transaction {hash:?}")]
    Aborted {
        /// Submitted transaction
        hash: H256,
    },
    /// The user interrupted the action before anything could be watched
    #[error("Interrupted by the user")]
    Interrupted,
    /// Missing or malformed configuration, e.g. the navigation parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SponsorError {
    /// Build an amount failure.
    pub fn invalid_amount(input: &str, source: AmountError) -> Self {
        Self::InvalidAmount {
            input: input.to_owned(),
            source,
        }
    }

    /// Build a read failure.
    pub fn read_failed(target: impl Into<ReadTarget>, source: ChainCommunicationError) -> Self {
        Self::ReadFailed {
            target: target.into(),
            source,
        }
    }

    /// The submitted transaction this failure concerns, if it got that far.
    pub fn transaction(&self) -> Option<H256> {
        match self {
            Self::TrackingLost { hash, .. }
            | Self::Reverted { hash }
            | Self::TimedOut { hash }
            | Self::Aborted { hash } => Some(*hash),
            _ => None,
        }
    }

    /// The string shown to the user in place of the result of the action.
    pub fn status_message(&self) -> String {
        match self {
            Self::WalletUnavailable => "Please install a wallet".to_owned(),
            Self::AuthorizationDenied => "Request declined in wallet".to_owned(),
            Self::ReadFailed { target, .. } => format!("{target} unavailable"),
            Self::InvalidAmount { input, .. } => format!("Invalid amount: {input}"),
            Self::UnsupportedMethod { method, .. } => format!("Unsupported action: {method}"),
            Self::SubmissionRejected { reason } => reason.clone(),
            Self::DuplicateSubmission { .. } => "Already in progress".to_owned(),
            Self::TrackingLost { hash, .. } => {
                format!("Status unknown, check transaction {hash:?} manually")
            }
            Self::Reverted { hash } => format!("Transaction {hash:?} reverted"),
            Self::TimedOut { hash } => {
                format!("Still pending, check transaction {hash:?} manually")
            }
            Self::Aborted { hash } => format!("Stopped watching transaction {hash:?}"),
            Self::Interrupted => "Interrupted".to_owned(),
            Self::InvalidConfiguration(msg) => msg.clone(),
        }
    }
}
