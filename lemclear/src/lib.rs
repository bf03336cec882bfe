use clap::Parser;
use std::path::PathBuf;

mod io;
pub use io::*;

mod commands;
pub use commands::*;

pub mod config;

// The top-level arguments: where the parameters come from, and what to do
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct BaseArgs {
    /// A TOML file of clearing parameters
    #[arg(short, long, global = true, env = "LEM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl BaseArgs {
    pub async fn evaluate(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Clear { io, mechanism } => {
                let params = config::load_params(self.config.as_deref())?;
                clear::run(&io, mechanism, &params)?;
            }
            Commands::Batch { io, mechanism } => {
                let params = config::load_params(self.config.as_deref())?;
                batch::run(&io, mechanism, params).await?;
            }
            Commands::Mechanisms => list::run(&mut std::io::stdout().lock())?,
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("config file {} does not exist", .0.display())]
    MissingConfig(PathBuf),
}
