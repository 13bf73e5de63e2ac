//! Command implementations

mod inspect;
mod tag;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    match cli.command {
        Commands::Tag(args) => tag::execute(args, &output, cli.config.as_deref()),
        Commands::Inspect(args) => inspect::execute(args, &output),
    }
}
