//! Command implementations

mod config;
mod run;
mod station;
mod transfer;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    match cli.command {
        Commands::Run(args) => run::execute(args, &output, cli.config.as_deref(), cli.explain),
        Commands::Station(args) => station::execute(args, &output),
        Commands::Transfer(args) => transfer::execute(args, &output, cli.config.as_deref()),
        Commands::Config(args) => config::execute(args, &output, cli.config.as_deref()),
    }
}
