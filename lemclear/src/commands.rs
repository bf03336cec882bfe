use super::IOArgs;
use clap::Subcommand;
use lem_core::models::Mechanism;

pub mod batch;
pub mod clear;
pub mod list;

#[derive(Subcommand)]
pub enum Commands {
    /// Clear a single period and report the result
    Clear {
        #[command(flatten)]
        io: IOArgs,

        /// The pricing mechanism for the residual
        #[arg(short, long, default_value = "MUP")]
        mechanism: Mechanism,
    },

    /// Clear every period of a market file, in parallel
    Batch {
        #[command(flatten)]
        io: IOArgs,

        /// The pricing mechanism for the residual
        #[arg(short, long, default_value = "MUP")]
        mechanism: Mechanism,
    },

    /// List the available pricing mechanisms
    Mechanisms,
}
