//! Handlers for `/api/voices`, `/api/status`, and `/api/stop`.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDto {
    pub id: String,
    pub name: String,
    pub sample_rate: u32,
}

/// `GET /api/voices` — snapshot of the catalog.
pub async fn voices(State(state): State<AppState>) -> Json<Vec<VoiceDto>> {
    let voices = state
        .catalog
        .list()
        .into_iter()
        .map(|v| VoiceDto {
            id: v.id,
            name: v.name,
            sample_rate: v.sample_rate,
        })
        .collect();
    Json(voices)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub running: bool,
    /// Voices with a loaded synthesizer handle.
    pub active_voices: usize,
    /// Queued utterances, excluding the one in flight.
    pub queue_depth: usize,
}

/// `GET /api/status`
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        running: true,
        active_voices: state.pool.handle_count(),
        queue_depth: state.queue.depth(),
    })
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub stopped: bool,
}

/// `POST /api/stop` — cancel playback and drop the queue.
pub async fn stop(State(state): State<AppState>) -> Json<StopResponse> {
    state.queue.stop_and_clear();
    Json(StopResponse { stopped: true })
}
