use std::fmt;

use time::OffsetDateTime;

use crate::{instance_methods, parse_amount, Address, SponsorError, H256, U256};

/// A state-changing call on an instance, with its argument in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceCall {
    /// Deposit `value` and mint claims for it
    Mint {
        /// Value attached to the transaction
        value: U256,
    },
    /// Burn `amount` claims and receive funds
    Redeem {
        /// Claims to redeem
        amount: U256,
    },
}

impl InstanceCall {
    /// A mint of the decimal amount the user entered.
    pub fn mint_from_input(input: &str) -> Result<Self, SponsorError> {
        parse_amount(input)
            .map(|value| Self::Mint { value })
            .map_err(|e| SponsorError::invalid_amount(input, e))
    }

    /// A redemption of the decimal amount the user entered.
    pub fn redeem_from_input(input: &str) -> Result<Self, SponsorError> {
        parse_amount(input)
            .map(|amount| Self::Redeem { amount })
            .map_err(|e| SponsorError::invalid_amount(input, e))
    }

    /// Interface entry this call targets.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Mint { .. } => instance_methods::MINT,
            Self::Redeem { .. } => instance_methods::REDEEM,
        }
    }

    /// The base-unit argument, whether attached as value or passed as a
    /// parameter.
    pub fn amount(&self) -> U256 {
        match self {
            Self::Mint { value } => *value,
            Self::Redeem { amount } => *amount,
        }
    }
}

impl fmt::Display for InstanceCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.method(), self.amount())
    }
}

/// A transaction accepted by the network but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Transaction hash
    pub hash: H256,
    /// Contract the call was sent to
    pub contract: Address,
    /// What was called
    pub call: InstanceCall,
    /// When the network accepted it
    pub submitted_at: OffsetDateTime,
}

impl PendingTransaction {
    /// Record a transaction accepted now.
    pub fn new(hash: H256, contract: Address, call: InstanceCall) -> Self {
        Self {
            hash,
            contract,
            call,
            submitted_at: OffsetDateTime::now_utc(),
        }
    }
}

/// The first confirmation observed for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// Transaction hash
    pub hash: H256,
    /// Block the transaction was included in, if reported
    pub block_number: Option<u64>,
    /// Receipt status; false if the transaction was mined but reverted
    pub succeeded: bool,
}

/// Lifecycle of a submitted transaction. Both non-initial states are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxLifecycle {
    /// Accepted by the network
    Submitted,
    /// One confirmation observed
    Confirmed,
    /// Channel error, cancellation or deadline
    Aborted,
}

impl TxLifecycle {
    /// Apply the outcome of a confirmation watch. Terminal states are never
    /// left.
    pub fn resolve(self, confirmed: bool) -> Self {
        match self {
            Self::Submitted if confirmed => Self::Confirmed,
            Self::Submitted => Self::Aborted,
            terminal => terminal,
        }
    }

    /// True once no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Submitted)
    }
}
