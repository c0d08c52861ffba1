//! Handlers for `/api/speak` and `/api/speak-selection`.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::state::AppState;

/// Source name used for hotkey/endpoint selection reads.
const SELECTION_SOURCE: &str = "speak-selection";

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpeakResponse {
    pub queued: bool,
    /// Request id; `null` when the submission was not admitted.
    pub id: Option<String>,
}

/// `POST /api/speak`
///
/// 202 for admitted and filter-rejected submissions alike (the `queued`
/// flag distinguishes them); 400 only for empty text.
pub async fn speak(
    State(state): State<AppState>,
    Json(req): Json<SpeakRequest>,
) -> Result<(StatusCode, Json<SpeakResponse>), HttpError> {
    if req.text.trim().is_empty() {
        return Err(HttpError::BadRequest("text is required".to_owned()));
    }

    let submission = state
        .router
        .submit(&req.text, req.source.as_deref(), req.voice.as_deref());
    Ok((
        StatusCode::ACCEPTED,
        Json(SpeakResponse {
            queued: submission.admitted,
            id: submission.id,
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct SpeakSelectionRequest {
    #[serde(default)]
    pub voice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpeakSelectionResponse {
    pub queued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The captured selection, empty when none was present.
    pub text: String,
}

/// `POST /api/speak-selection`
///
/// Captures the current OS selection (clipboard-preserving) and routes it
/// through the `speak-selection` source. 200 with `queued: false` when no
/// selection is present, 202 otherwise.
pub async fn speak_selection(
    State(state): State<AppState>,
    body: Option<Json<SpeakSelectionRequest>>,
) -> Result<(StatusCode, Json<SpeakSelectionResponse>), HttpError> {
    let voice = body.and_then(|Json(req)| req.voice);

    let Some(text) = state.capture.capture().await else {
        return Ok((
            StatusCode::OK,
            Json(SpeakSelectionResponse {
                queued: false,
                id: None,
                text: String::new(),
            }),
        ));
    };

    let submission = state
        .router
        .submit(&text, Some(SELECTION_SOURCE), voice.as_deref());
    Ok((
        StatusCode::ACCEPTED,
        Json(SpeakSelectionResponse {
            queued: submission.admitted,
            id: submission.id,
            text,
        }),
    ))
}
