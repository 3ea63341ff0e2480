use std::fmt;

use ethers_core::utils::to_checksum;
use serde::{Deserialize, Serialize};

use crate::Address;

/// A ledger address currently authorized for signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(Address);

impl Account {
    /// Wrap an authorized address.
    pub fn new(address: Address) -> Self {
        Self(address)
    }

    /// The underlying address.
    pub fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for Account {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_checksum(&self.0, None))
    }
}

/// Which of the two known contract kinds a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContractRole {
    /// The well-known contract enumerating instance addresses
    Registry,
    /// One child contract exposing mint/redeem and display state
    Instance,
}

impl fmt::Display for ContractRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry => f.write_str("registry"),
            Self::Instance => f.write_str("instance"),
        }
    }
}

/// Whether a method only reads state or submits a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Served by `eth_call`
    Read,
    /// Requires a signed transaction
    StateChanging {
        /// Whether value may be attached to the call
        payable: bool,
    },
}

/// One entry of an interface descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Method name as it appears in the ABI
    pub name: &'static str,
    /// Human-readable ABI signature
    pub signature: &'static str,
    /// Read or state-changing
    pub kind: MethodKind,
}

impl MethodDescriptor {
    const fn read(name: &'static str, signature: &'static str) -> Self {
        Self {
            name,
            signature,
            kind: MethodKind::Read,
        }
    }

    const fn write(name: &'static str, signature: &'static str, payable: bool) -> Self {
        Self {
            name,
            signature,
            kind: MethodKind::StateChanging { payable },
        }
    }

    /// True if calling this method submits a transaction.
    pub fn is_state_changing(&self) -> bool {
        matches!(self.kind, MethodKind::StateChanging { .. })
    }
}

/// Method names of the registry contract.
pub mod registry_methods {
    /// Number of registered instances
    pub const INSTANCE_COUNT: &str = "projectNumber";
    /// Instance address by index
    pub const INSTANCE_AT: &str = "allProjects";
}

/// Method names of the instance contract.
pub mod instance_methods {
    /// Display name
    pub const NAME: &str = "sponseredName";
    /// External reference URI
    pub const REFERENCE_URI: &str = "sponseredURI";
    /// Beneficiary address
    pub const BENEFICIARY: &str = "sponsoredAddr";
    /// Claim balance of an account
    pub const BALANCE_OF: &str = "balanceOf";
    /// Total claims outstanding
    pub const TOTAL_SUPPLY: &str = "totalSupply";
    /// Deposit attached value and mint claims
    pub const MINT: &str = "mint";
    /// Burn claims and pay out funds
    pub const REDEEM: &str = "redeem";
}

const REGISTRY_METHODS: &[MethodDescriptor] = &[
    MethodDescriptor::read(
        registry_methods::INSTANCE_COUNT,
        "function projectNumber() external view returns (uint256)",
    ),
    MethodDescriptor::read(
        registry_methods::INSTANCE_AT,
        "function allProjects(uint256) external view returns (address)",
    ),
];

const INSTANCE_METHODS: &[MethodDescriptor] = &[
    MethodDescriptor::read(
        instance_methods::NAME,
        "function sponseredName() external view returns (string)",
    ),
    MethodDescriptor::read(
        instance_methods::REFERENCE_URI,
        "function sponseredURI() external view returns (string)",
    ),
    MethodDescriptor::read(
        instance_methods::BENEFICIARY,
        "function sponsoredAddr() external view returns (address)",
    ),
    MethodDescriptor::read(
        instance_methods::BALANCE_OF,
        "function balanceOf(address) external view returns (uint256)",
    ),
    MethodDescriptor::read(
        instance_methods::TOTAL_SUPPLY,
        "function totalSupply() external view returns (uint256)",
    ),
    MethodDescriptor::write(instance_methods::MINT, "function mint() external payable", true),
    MethodDescriptor::write(
        instance_methods::REDEEM,
        "function redeem(uint256) external",
        false,
    ),
];

/// An ordered set of callable and readable method signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractInterface {
    methods: &'static [MethodDescriptor],
}

impl ContractInterface {
    /// Interface of the registry contract
    pub const REGISTRY: Self = Self {
        methods: REGISTRY_METHODS,
    };

    /// Interface of an instance contract
    pub const INSTANCE: Self = Self {
        methods: INSTANCE_METHODS,
    };

    /// The descriptor for a role.
    pub fn for_role(role: ContractRole) -> Self {
        match role {
            ContractRole::Registry => Self::REGISTRY,
            ContractRole::Instance => Self::INSTANCE,
        }
    }

    /// All entries in declaration order.
    pub fn methods(&self) -> &'static [MethodDescriptor] {
        self.methods
    }

    /// Look up an entry by name.
    pub fn method(&self, name: &str) -> Option<&'static MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// True if `name` is a state-changing entry of this interface.
    pub fn is_state_changing(&self, name: &str) -> bool {
        self.method(name)
            .map(MethodDescriptor::is_state_changing)
            .unwrap_or(false)
    }

    /// Human-readable ABI signatures, suitable for an ABI parser.
    pub fn signatures(&self) -> Vec<&'static str> {
        self.methods.iter().map(|m| m.signature).collect()
    }
}

/// A contract address together with the interface it is called through.
/// Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractRef {
    address: Address,
    role: ContractRole,
    interface: ContractInterface,
}

impl ContractRef {
    /// Reference to the registry at `address`.
    pub fn registry(address: Address) -> Self {
        Self::new(address, ContractRole::Registry)
    }

    /// Reference to an instance at `address`.
    pub fn instance(address: Address) -> Self {
        Self::new(address, ContractRole::Instance)
    }

    fn new(address: Address, role: ContractRole) -> Self {
        Self {
            address,
            role,
            interface: ContractInterface::for_role(role),
        }
    }

    /// Network address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Registry or instance.
    pub fn role(&self) -> ContractRole {
        self.role
    }

    /// Interface descriptor.
    pub fn interface(&self) -> &ContractInterface {
        &self.interface
    }
}
