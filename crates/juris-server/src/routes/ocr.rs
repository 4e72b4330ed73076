//! OCR route — transcribe scanned document pages.
//!
//! Pages are already natural chunks, so each page is its own
//! invocation; the handler stitches the transcriptions back together
//! in page order. A failed page fails the whole document — partial
//! transcriptions are worse than a retryable error for study material.

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

#[derive(Debug, Clone, Deserialize)]
pub struct OcrRequest {
    pub pages: Vec<OcrPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrPage {
    /// Base64-encoded page image.
    pub data: String,
    #[serde(default = "default_mime", rename = "mimeType")]
    pub mime_type: String,
}

fn default_mime() -> String {
    "image/png".to_string()
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ocr", post(ocr))
}

async fn ocr(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OcrRequest>,
) -> impl IntoResponse {
    let (keys, model) = {
        let providers = state.providers.read();
        (providers.gemini_keys.clone(), providers.text_model.clone())
    };

    if req.pages.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": "no pages supplied",
            })),
        );
    }

    let mut transcriptions = Vec::with_capacity(req.pages.len());
    for page in &req.pages {
        // The image travels in the request body, not the invoker
        // payload; a one-character payload keeps this a single chunk.
        let options = state.invoke_options(ChunkPolicy::new(1));
        let result = invoke(
            &state.transport,
            ".",
            &keys,
            &options,
            |_, _| gemini::ocr_request(&model, &page.mime_type, &page.data),
            gemini::extract_text,
        )
        .await;

        match result {
            Ok(mut parts) => transcriptions.append(&mut parts),
            Err(err) => return invoke_error_response(err),
        }
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "text": transcriptions.join("\n\n"),
            "pages": transcriptions.len(),
        })),
    )
}
