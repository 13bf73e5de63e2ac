//! Phototag CLI - Command-line interface
//!
//! Geotags photos by correlating capture timestamps against GPS track
//! logs. This crate is the terminal adapter around phototag-core.

mod batch;
mod cli;
mod commands;
mod exif;
mod output;
mod progress;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute the command
    commands::execute(cli)?;

    Ok(())
}
