//! Core types and chain-facing traits of the sponsor-pool client.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub use ethers_core::types::{Address, H160, H256, U256};

pub use amount::*;
pub use error::*;
pub use traits::*;
pub use types::*;

/// Decimal amount conversion
pub mod amount;
mod error;
mod traits;
mod types;
