//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the speakd text-to-speech service.
#[derive(Parser)]
#[command(name = "speakd")]
#[command(about = "Local text-to-speech daemon with priority routing")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Daemon port override (client commands and serve)
    #[arg(long = "port", global = true)]
    pub port: Option<u16>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The config file to load; `speakd.json` next to the working
    /// directory when not given.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from("speakd.json"))
    }
}
