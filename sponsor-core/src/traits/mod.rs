pub use confirmation::*;
pub use contracts::*;
pub use factory::*;
pub use wallet::*;

mod confirmation;
mod contracts;
mod factory;
mod wallet;
