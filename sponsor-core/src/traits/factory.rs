use std::fmt::Debug;
use std::sync::Arc;

use auto_impl::auto_impl;

use crate::{Account, ChainResult, ContractRef, InstanceContract, RegistryContract};

/// Builds callable contract handles from a reference and the account that
/// signs for them.
#[auto_impl(&, Box, Arc)]
pub trait ContractFactory: Send + Sync + Debug {
    /// Build a registry handle.
    fn build_registry(
        &self,
        contract: &ContractRef,
        signer: Account,
    ) -> ChainResult<Arc<dyn RegistryContract>>;

    /// Build an instance handle whose state-changing calls are sent as
    /// `signer`.
    fn build_instance(
        &self,
        contract: &ContractRef,
        signer: Account,
    ) -> ChainResult<Arc<dyn InstanceContract>>;
}
