//! Audio route — narrated lesson from study text.
//!
//! The TTS endpoint takes far less text per call than the generative
//! one, so most lessons split into several chunks. Per-chunk base64
//! audio comes back in order; the frontend concatenates the parts.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::routes::invoke_error_response;
use crate::state::AppState;
use juris_invoke::{invoke, ChunkPolicy};
use juris_providers::gemini;

/// Documented TTS payload ceiling.
const MAX_BYTES: usize = 3_500;
const BOUNDARY: &str = "\n\n";

#[derive(Debug, Clone, Deserialize)]
pub struct AudioRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/audio", post(audio))
}

async fn audio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AudioRequest>,
) -> impl IntoResponse {
    let (keys, model, default_voice) = {
        let providers = state.providers.read();
        (
            providers.gemini_keys.clone(),
            providers.tts_model.clone(),
            providers.tts_voice.clone(),
        )
    };

    let voice = req.voice.unwrap_or(default_voice);

    let options = state.invoke_options(ChunkPolicy::with_boundary(MAX_BYTES, BOUNDARY));
    let result = invoke(
        &state.transport,
        &req.text,
        &keys,
        &options,
        |chunk, _| gemini::tts_request(&model, &voice, chunk),
        gemini::extract_audio,
    )
    .await;

    match result {
        Ok(audio_parts) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "audioParts": audio_parts,
                "mimeType": "audio/pcm",
                "voice": voice,
            })),
        ),
        Err(err) => invoke_error_response(err),
    }
}
