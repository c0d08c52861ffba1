//! # speakd-cli
//!
//! The `speakd` binary: `serve` runs the daemon; the other subcommands are
//! a thin HTTP client against a running daemon.

#![deny(unused_crate_dependencies)]

pub mod bootstrap;
pub mod client;
pub mod commands;
pub mod parser;

pub use bootstrap::bootstrap;
pub use client::ApiClient;
pub use commands::Commands;
pub use parser::Cli;

// Used from the binary entry point only; referenced here so the
// unused-crate-dependencies lint sees them from the library target too.
use tokio as _;
use tracing_subscriber as _;
