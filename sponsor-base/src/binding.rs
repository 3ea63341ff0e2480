use std::sync::Arc;

use tracing::{debug, instrument, warn};

use sponsor_core::{
    registry_methods, Account, ContractFactory, ContractRef, ContractRole, InstanceContract,
    RegistryContract, SponsorError, SponsorResult,
};

use crate::WalletConnector;

#[derive(Debug, Clone)]
enum BoundContract {
    Registry(Arc<dyn RegistryContract>),
    Instance(Arc<dyn InstanceContract>),
}

/// A contract bound to the signing account that was current when it was
/// created. Handles are never re-pointed; bind again after the account
/// changes.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    contract: ContractRef,
    signer: Account,
    bound: BoundContract,
}

impl ContractHandle {
    /// The contract reference this handle was bound from.
    pub fn contract(&self) -> &ContractRef {
        &self.contract
    }

    /// The account state-changing calls are signed with.
    pub fn signer(&self) -> Account {
        self.signer
    }

    /// Registry operations. Fails for instance handles.
    pub fn registry(&self) -> SponsorResult<&Arc<dyn RegistryContract>> {
        match &self.bound {
            BoundContract::Registry(registry) => Ok(registry),
            BoundContract::Instance(_) => Err(SponsorError::UnsupportedMethod {
                method: registry_methods::INSTANCE_COUNT.to_owned(),
                role: self.contract.role(),
            }),
        }
    }

    /// Instance operations. Fails for registry handles.
    pub fn instance(&self) -> SponsorResult<&Arc<dyn InstanceContract>> {
        match &self.bound {
            BoundContract::Instance(instance) => Ok(instance),
            BoundContract::Registry(_) => Err(SponsorError::UnsupportedMethod {
                method: "instance read".to_owned(),
                role: self.contract.role(),
            }),
        }
    }

    /// True once the connector no longer reports the account this handle
    /// was bound to.
    pub fn is_stale(&self, connector: &WalletConnector) -> bool {
        connector.current_account() != Some(self.signer)
    }
}

/// Pairs contract references with the currently authorized account.
#[derive(Debug, Clone)]
pub struct ContractBinding {
    connector: Arc<WalletConnector>,
    factory: Option<Arc<dyn ContractFactory>>,
}

impl ContractBinding {
    /// Create a binding. Without a factory every bind reports that no wallet
    /// is available.
    pub fn new(connector: Arc<WalletConnector>, factory: Option<Arc<dyn ContractFactory>>) -> Self {
        Self { connector, factory }
    }

    /// The connector whose account is used for binding.
    pub fn connector(&self) -> &Arc<WalletConnector> {
        &self.connector
    }

    /// Bind `contract` to the current signing account.
    #[instrument(skip(self), fields(address = ?contract.address(), role = %contract.role()))]
    pub fn bind(&self, contract: &ContractRef) -> SponsorResult<ContractHandle> {
        let Some(factory) = self.factory.as_ref() else {
            return Err(SponsorError::WalletUnavailable);
        };
        let Some(signer) = self.connector.current_account() else {
            warn!("Binding requested before a wallet connected");
            return Err(SponsorError::WalletUnavailable);
        };

        let bound = match contract.role() {
            ContractRole::Registry => factory
                .build_registry(contract, signer)
                .map(BoundContract::Registry),
            ContractRole::Instance => factory
                .build_instance(contract, signer)
                .map(BoundContract::Instance),
        }
        .map_err(|err| SponsorError::InvalidConfiguration(err.to_string()))?;

        debug!(%signer, "Bound contract");
        Ok(ContractHandle {
            contract: *contract,
            signer,
            bound,
        })
    }
}
