//! Route definitions and router construction.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// All API routes without the `/api` prefix; the caller nests them.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/speak", post(handlers::speak::speak))
        .route("/speak-selection", post(handlers::speak::speak_selection))
        .route("/voices", get(handlers::system::voices))
        .route("/status", get(handlers::system::status))
        .route("/stop", post(handlers::system::stop))
}

/// Build the full router: `/health` plus `/api/*`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes().with_state(state))
}

/// Liveness probe.
async fn health_check() -> &'static str {
    "OK"
}
