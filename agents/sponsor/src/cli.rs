use clap::{Parser, Subcommand};

use sponsor_base::InstanceTarget;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print results as JSON
    #[clap(long, global = true)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Authorize an account in the wallet
    Connect,
    /// List every pool registered in the registry
    List,
    /// Show the state of one pool
    Show {
        /// Pool address, `address=0x...` query or detail link
        instance: InstanceTarget,
    },
    /// Deposit funds into a pool and mint claims
    Mint {
        /// Pool address, `address=0x...` query or detail link
        instance: InstanceTarget,
        /// Amount to deposit, in asset units, e.g. `0.5`
        #[clap(allow_hyphen_values = true)]
        amount: String,
    },
    /// Redeem claims for funds
    Redeem {
        /// Pool address, `address=0x...` query or detail link
        instance: InstanceTarget,
        /// Claims to redeem, in asset units
        #[clap(allow_hyphen_values = true)]
        amount: String,
    },
}
