pub use contract::*;
pub use instance::*;
pub use transaction::*;

mod contract;
mod instance;
mod transaction;
