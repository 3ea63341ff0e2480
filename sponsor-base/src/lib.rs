//! This crate contains the client logic of the sponsor-pool tool: wallet
//! connection, contract binding, registry and instance reads, transaction
//! submission and confirmation tracking. It also holds the settings and
//! tracing setup shared by binaries.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod settings;

mod binding;
pub use binding::*;

mod client;
pub use client::*;

mod confirmation;
pub use confirmation::*;

mod instance;
pub use instance::*;

mod navigation;
pub use navigation::*;

mod registry;
pub use registry::*;

mod submit;
pub use submit::*;

mod wallet;
pub use wallet::*;
