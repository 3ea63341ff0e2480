use std::fmt;
use std::str::FromStr;

use url::{form_urlencoded, Url};

use sponsor_core::{Address, ContractRef, SponsorError, SponsorResult};

/// Query parameter carrying the instance address on the detail screen.
pub const ADDRESS_PARAM: &str = "address";

/// The instance a detail screen or action is aimed at. Accepts a bare
/// address, a query string such as `address=0x...`, or a full link as
/// produced by [`sponsor_core::InstanceListEntry::link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceTarget {
    address: Address,
}

impl InstanceTarget {
    /// Target a known address.
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Parse a navigation parameter.
    pub fn parse(input: &str) -> SponsorResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SponsorError::InvalidConfiguration(
                "No instance address given".to_owned(),
            ));
        }

        let raw = if input.contains('=') || input.contains('?') {
            let query = match Url::parse(input) {
                Ok(url) => url.query().unwrap_or_default().to_owned(),
                Err(_) => match input.split_once('?') {
                    Some((_, query)) => query.to_owned(),
                    None => input.to_owned(),
                },
            };
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == ADDRESS_PARAM)
                .map(|(_, value)| value.into_owned())
                .ok_or_else(|| {
                    SponsorError::InvalidConfiguration(format!(
                        "Missing `{ADDRESS_PARAM}` parameter in {input:?}"
                    ))
                })?
        } else {
            input.to_owned()
        };

        parse_address(&raw).map(Self::new)
    }

    /// The instance address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// A contract reference for binding the instance.
    pub fn contract_ref(&self) -> ContractRef {
        ContractRef::instance(self.address)
    }
}

impl FromStr for InstanceTarget {
    type Err = SponsorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InstanceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.address)
    }
}

fn parse_address(raw: &str) -> SponsorResult<Address> {
    let invalid = || SponsorError::InvalidConfiguration(format!("Invalid instance address {raw:?}"));
    let digits = raw.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    Address::from_str(digits).map_err(|_| invalid())
}
