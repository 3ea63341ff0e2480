//! Mocks and fakes for testing code built on the sponsor-pool traits.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

/// Mockall mocks of the chain-facing traits
pub mod mocks;
/// Hand-written fakes and fixtures
pub mod test_utils;
