//! Subcommand definitions.

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the daemon (the default when no subcommand is given)
    Serve,

    /// Submit text to a running daemon
    Speak {
        /// Text to speak
        text: String,

        /// Source bucket to route through
        #[arg(long)]
        source: Option<String>,

        /// Voice override
        #[arg(long)]
        voice: Option<String>,
    },

    /// List the voices a running daemon has installed
    Voices,

    /// Show queue depth and loaded voices of a running daemon
    Status,

    /// Cancel playback and clear the queue of a running daemon
    Stop,
}
