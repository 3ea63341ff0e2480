pub mod confirmation;
pub mod instance;
pub mod registry;
pub mod wallet;
