use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Phototag - Geotag photos from GPS track logs
#[derive(Parser, Debug)]
#[command(name = "phototag")]
#[command(about = "Geotag photos from GPS track logs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Match photos against track logs and write positions
    Tag(TagArgs),

    /// Parse track files and report what they contain
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
pub struct TagArgs {
    /// Photos to geotag. Any argument that turns out to be a track
    /// file is loaded as one instead.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Track log files (GPX or KML) to load before tagging
    #[arg(long = "track", value_name = "FILE")]
    pub tracks: Vec<PathBuf>,

    /// Camera clock offset in seconds, added to each capture time
    /// (negative when the camera clock runs ahead of the GPS clock)
    #[arg(long, allow_hyphen_values = true, value_name = "SECONDS")]
    pub offset: Option<i64>,

    /// Persist computed positions instead of only reporting them
    #[arg(long)]
    pub commit: bool,

    /// Leave elevation out of persisted records
    #[arg(long)]
    pub no_elevation: bool,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Track files to inspect
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}
