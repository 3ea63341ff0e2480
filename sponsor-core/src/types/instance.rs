use std::fmt;

use serde::Serialize;

use crate::{Address, U256};

/// One row of the instance listing. Index order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstanceListEntry {
    /// Registry-assigned position
    pub index: u64,
    /// Address of the instance contract
    pub address: Address,
}

impl InstanceListEntry {
    /// Link to the detail screen for this instance.
    pub fn link(&self) -> String {
        format!("pool.html?address={:?}", self.address)
    }
}

/// The display fields of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InstanceField {
    /// `sponseredName()`
    DisplayName,
    /// `sponseredURI()`
    ReferenceUri,
    /// `sponsoredAddr()`
    Beneficiary,
    /// `balanceOf(caller)`
    CallerBalance,
    /// `totalSupply()`
    TotalSupply,
}

impl InstanceField {
    /// All fields in the order they are read and displayed.
    pub const ALL: [InstanceField; 5] = [
        Self::DisplayName,
        Self::ReferenceUri,
        Self::Beneficiary,
        Self::CallerBalance,
        Self::TotalSupply,
    ];
}

impl fmt::Display for InstanceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DisplayName => "name",
            Self::ReferenceUri => "reference URI",
            Self::Beneficiary => "beneficiary",
            Self::CallerBalance => "balance",
            Self::TotalSupply => "total supply",
        })
    }
}

/// What a failed read was trying to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadTarget {
    /// The registry's instance count
    RegistryCount,
    /// One registry entry
    Index(u64),
    /// One instance field
    Field(InstanceField),
}

impl From<InstanceField> for ReadTarget {
    fn from(field: InstanceField) -> Self {
        Self::Field(field)
    }
}

impl fmt::Display for ReadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistryCount => f.write_str("registry size"),
            Self::Index(index) => write!(f, "registry entry #{index}"),
            Self::Field(field) => field.fmt(f),
        }
    }
}

/// A caller balance larger than the total supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("caller balance {balance} exceeds total supply {supply}")]
pub struct BalanceExceedsSupply {
    /// Balance read for the caller
    pub balance: U256,
    /// Total supply read
    pub supply: U256,
}

/// State of one instance as seen by the bound account. Amounts are in base
/// units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceState {
    display_name: String,
    reference_uri: String,
    beneficiary: Address,
    caller_balance: U256,
    total_supply: U256,
}

impl InstanceState {
    /// Assemble a state, checking that the caller cannot hold more than the
    /// total supply.
    pub fn new(
        display_name: String,
        reference_uri: String,
        beneficiary: Address,
        caller_balance: U256,
        total_supply: U256,
    ) -> Result<Self, BalanceExceedsSupply> {
        if caller_balance > total_supply {
            return Err(BalanceExceedsSupply {
                balance: caller_balance,
                supply: total_supply,
            });
        }
        Ok(Self {
            display_name,
            reference_uri,
            beneficiary,
            caller_balance,
            total_supply,
        })
    }

    /// Display name of the instance.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// External reference URI.
    pub fn reference_uri(&self) -> &str {
        &self.reference_uri
    }

    /// Who receives the deposited funds.
    pub fn beneficiary(&self) -> Address {
        self.beneficiary
    }

    /// Claims held by the bound account.
    pub fn caller_balance(&self) -> U256 {
        self.caller_balance
    }

    /// Claims outstanding.
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn balance_above_supply_is_rejected() {
        let err = InstanceState::new(
            "pool".into(),
            "https://example.org".into(),
            Address::zero(),
            U256::from(2),
            U256::from(1),
        )
        .unwrap_err();
        assert_eq!(err.balance, U256::from(2));

        let state = InstanceState::new(
            "pool".into(),
            "https://example.org".into(),
            Address::zero(),
            U256::from(1),
            U256::from(1),
        )
        .unwrap();
        assert!(state.caller_balance() <= state.total_supply());
    }

    #[test]
    fn entries_link_to_the_detail_screen() {
        let entry = InstanceListEntry {
            index: 0,
            address: Address::repeat_byte(0xaa),
        };
        assert_eq!(
            entry.link(),
            "pool.html?address=0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        );
    }
}
