use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tmdb_backdrop_common::MediaKind;

#[derive(Parser)]
#[command(name = "tmdb-backdrop")]
#[command(author, version, about = "TMDB backdrops for Stash group pages")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the TMDB reference attached to a group
    Resolve {
        /// Stash group id
        #[arg(required = true)]
        group_id: String,
    },

    /// Print a randomly chosen backdrop URL for a TMDB title
    Backdrop {
        /// Title kind: movie, tv or collection
        #[arg(value_parser = parse_kind)]
        kind: MediaKind,

        /// TMDB id
        id: String,
    },

    /// Run one update cycle for a location and print the stylesheet
    Render {
        /// Location path, e.g. /groups/42
        #[arg(long)]
        path: String,

        /// Write the stylesheet to this file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Follow navigation paths read from stdin, one per line, and keep the
    /// stylesheet file in sync
    Watch {
        /// Stylesheet file to maintain
        #[arg(short, long)]
        output: PathBuf,

        /// Location before the first navigation
        #[arg(long, default_value = "/")]
        start: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn parse_kind(s: &str) -> Result<MediaKind, String> {
    s.parse().map_err(|e: tmdb_backdrop_common::Error| e.to_string())
}
