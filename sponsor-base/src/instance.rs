use std::sync::Arc;

use futures::join;
use serde::Serialize;
use tracing::{instrument, warn};

use sponsor_core::{
    format_amount, Account, ChainCommunicationError, InstanceContract, InstanceField,
    InstanceState, SponsorError, SponsorResult,
};

use crate::ContractHandle;

/// Reads the display state of an instance as seen by the bound account.
#[derive(Debug, Clone)]
pub struct InstanceReader {
    instance: Arc<dyn InstanceContract>,
    caller: Account,
}

impl InstanceReader {
    /// Read through an instance handle. The caller balance is read for the
    /// handle's signing account.
    pub fn new(handle: &ContractHandle) -> SponsorResult<Self> {
        Ok(Self {
            instance: handle.instance()?.clone(),
            caller: handle.signer(),
        })
    }

    /// Issue all five field reads concurrently and assemble the state once
    /// every one has resolved. If several fail, the first failing field in
    /// display order is reported.
    #[instrument(err, skip(self), fields(instance = ?self.instance.address(), caller = %self.caller))]
    pub async fn read(&self) -> SponsorResult<InstanceState> {
        let (display_name, reference_uri, beneficiary, caller_balance, total_supply) = join!(
            self.instance.display_name(),
            self.instance.reference_uri(),
            self.instance.beneficiary(),
            self.instance.balance_of(self.caller.address()),
            self.instance.total_supply(),
        );

        let failed = |field: InstanceField| move |e| SponsorError::read_failed(field, e);
        let display_name = display_name.map_err(failed(InstanceField::DisplayName))?;
        let reference_uri = reference_uri.map_err(failed(InstanceField::ReferenceUri))?;
        let beneficiary = beneficiary.map_err(failed(InstanceField::Beneficiary))?;
        let caller_balance = caller_balance.map_err(failed(InstanceField::CallerBalance))?;
        let total_supply = total_supply.map_err(failed(InstanceField::TotalSupply))?;

        InstanceState::new(
            display_name,
            reference_uri,
            beneficiary,
            caller_balance,
            total_supply,
        )
        .map_err(|e| {
            warn!(error = %e, "Inconsistent instance state");
            SponsorError::read_failed(
                InstanceField::CallerBalance,
                ChainCommunicationError::from_other(e),
            )
        })
    }
}

/// Placeholder shown for a field that could not be read.
pub const UNAVAILABLE: &str = "unavailable";

/// The rendered form of an instance state; amounts are in asset units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceDisplay {
    /// Display name
    pub name: String,
    /// Reference URI
    pub reference_uri: String,
    /// Beneficiary address
    pub beneficiary: String,
    /// Claims held by the caller
    pub balance: String,
    /// Claims outstanding
    pub total_supply: String,
}

impl InstanceDisplay {
    /// Every field marked unavailable.
    pub fn unavailable() -> Self {
        Self {
            name: UNAVAILABLE.to_owned(),
            reference_uri: UNAVAILABLE.to_owned(),
            beneficiary: UNAVAILABLE.to_owned(),
            balance: UNAVAILABLE.to_owned(),
            total_supply: UNAVAILABLE.to_owned(),
        }
    }

    /// Render a read result. A failed read never shows stale or zero values.
    pub fn from_result(result: &SponsorResult<InstanceState>) -> Self {
        match result {
            Ok(state) => state.into(),
            Err(_) => Self::unavailable(),
        }
    }

    /// Label and value pairs in display order.
    pub fn rows(&self) -> [(InstanceField, &str); 5] {
        [
            (InstanceField::DisplayName, &self.name),
            (InstanceField::ReferenceUri, &self.reference_uri),
            (InstanceField::Beneficiary, &self.beneficiary),
            (InstanceField::CallerBalance, &self.balance),
            (InstanceField::TotalSupply, &self.total_supply),
        ]
    }
}

impl From<&InstanceState> for InstanceDisplay {
    fn from(state: &InstanceState) -> Self {
        Self {
            name: state.display_name().to_owned(),
            reference_uri: state.reference_uri().to_owned(),
            beneficiary: format!("{:?}", state.beneficiary()),
            balance: format_amount(state.caller_balance()),
            total_supply: format_amount(state.total_supply()),
        }
    }
}

#[cfg(test)]
mod test {
    use sponsor_core::{Address, ReadTarget, U256};
    use sponsor_test::mocks::instance::MockInstanceContract;
    use sponsor_test::test_utils::account;

    use super::*;

    fn reader(instance: MockInstanceContract) -> InstanceReader {
        InstanceReader {
            instance: Arc::new(instance),
            caller: account(7),
        }
    }

    fn mock() -> MockInstanceContract {
        let mut instance = MockInstanceContract::new();
        instance
            .expect__address()
            .returning(|| Address::repeat_byte(0xcc));
        instance
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn reads_every_field_for_the_caller() {
        let mut instance = mock();
        instance.expect_state(
            "Clean Water",
            "https://example.org/water",
            Address::repeat_byte(0xbe),
            U256::exp10(18),
            U256::exp10(18) * 3,
        );

        let state = reader(instance).read().await.unwrap();
        assert_eq!(state.display_name(), "Clean Water");
        assert_eq!(state.caller_balance(), U256::exp10(18));

        let display = InstanceDisplay::from(&state);
        assert_eq!(display.balance, "1.0");
        assert_eq!(display.total_supply, "3.0");
        assert_eq!(
            display.beneficiary,
            "0xbebebebebebebebebebebebebebebebebebebebe"
        );
    }

    #[tokio::test]
    async fn balance_is_read_for_the_bound_account() {
        let mut instance = mock();
        instance.expect__display_name().returning(|| Ok("x".into()));
        instance.expect__reference_uri().returning(|| Ok("y".into()));
        instance
            .expect__beneficiary()
            .returning(|| Ok(Address::zero()));
        instance
            .expect__balance_of()
            .withf(|account| *account == Address::repeat_byte(7))
            .times(1)
            .returning(|_| Ok(U256::zero()));
        instance
            .expect__total_supply()
            .returning(|| Ok(U256::zero()));

        assert!(reader(instance).read().await.is_ok());
    }

    #[tokio::test]
    async fn first_failing_field_is_reported() {
        let mut instance = mock();
        instance.expect__display_name().returning(|| Ok("x".into()));
        instance.expect__reference_uri().returning(|| Ok("y".into()));
        instance
            .expect__beneficiary()
            .returning(|| Err(ChainCommunicationError::from_other_str("decode")));
        instance
            .expect__balance_of()
            .returning(|_| Ok(U256::zero()));
        instance
            .expect__total_supply()
            .returning(|| Err(ChainCommunicationError::from_other_str("timeout")));

        let result = reader(instance).read().await;
        assert!(matches!(
            result,
            Err(SponsorError::ReadFailed {
                target: ReadTarget::Field(InstanceField::Beneficiary),
                ..
            })
        ));
        assert_eq!(InstanceDisplay::from_result(&result), InstanceDisplay::unavailable());
    }

    #[tokio::test]
    async fn balance_above_supply_is_a_read_failure() {
        let mut instance = mock();
        instance.expect_state("x", "y", Address::zero(), U256::from(5), U256::from(4));

        let err = reader(instance).read().await.unwrap_err();
        assert_eq!(err.status_message(), "balance unavailable");
    }

    #[tokio::test]
    async fn reads_without_intervening_writes_agree() {
        let mut instance = mock();
        instance
            .expect__display_name()
            .times(2)
            .returning(|| Ok("pool".into()));
        instance.expect__reference_uri().returning(|| Ok("uri".into()));
        instance
            .expect__beneficiary()
            .returning(|| Ok(Address::repeat_byte(1)));
        instance
            .expect__balance_of()
            .returning(|_| Ok(U256::from(2)));
        instance
            .expect__total_supply()
            .returning(|| Ok(U256::from(9)));

        let reader = reader(instance);
        assert_eq!(reader.read().await.unwrap(), reader.read().await.unwrap());
    }
}
