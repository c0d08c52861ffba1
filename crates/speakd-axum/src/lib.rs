//! # speakd-axum
//!
//! The localhost HTTP surface of the speakd daemon. Handlers are thin
//! wrappers: each calls exactly one core operation and returns JSON.
//! Admission completes before synthesis, so playback and synthesis
//! failures are never surfaced to HTTP callers.

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tower as _;

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppState, ServiceContext};

use std::net::SocketAddr;

/// Serve the API on loopback. Runs until the listener task is aborted.
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "speakd HTTP API listening");
    axum::serve(listener, create_router(state)).await
}
