//! Summary route — condensed study notes for long legal text.
//!
//! Long statutes exceed one call; the payload is split at article
//! boundaries and each chunk gets a continuation-aware prompt so the
//! model knows whether it is opening, continuing, or closing the
//! summary.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::routes::invoke_error_response;
use crate::state::AppState;
use juris_invoke::{invoke, ChunkPolicy, ChunkPosition};
use juris_providers::gemini;

/// Hand-tuned to the text model's context budget.
const MAX_BYTES: usize = 20_000;
/// Statute text splits cleanly at article markers.
const BOUNDARY: &str = "\nArt.";

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRequest {
    pub text: String,
    #[serde(default, rename = "lawName")]
    pub law_name: Option<String>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/summary", post(summary))
}

fn chunk_prompt(chunk: &str, position: ChunkPosition, law: &str) -> String {
    let instruction = match position {
        ChunkPosition::Only => format!(
            "Resuma o texto legal abaixo de {} em tópicos de estudo, \
             destacando prazos, competências e exceções.",
            law
        ),
        ChunkPosition::First => format!(
            "Este é o início de {}. Resuma em tópicos de estudo, destacando \
             prazos, competências e exceções. O texto continua em outra parte; \
             não conclua o resumo ainda.",
            law
        ),
        ChunkPosition::Middle => "Continuação do mesmo texto legal. Continue o resumo em tópicos, \
             no mesmo estilo, sem repetir o que já foi resumido e sem concluir."
            .to_string(),
        ChunkPosition::Last => "Parte final do mesmo texto legal. Conclua o resumo em tópicos, \
             no mesmo estilo."
            .to_string(),
    };
    format!("{}\n\n{}", instruction, chunk)
}

async fn summary(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummaryRequest>,
) -> impl IntoResponse {
    let (keys, model) = {
        let providers = state.providers.read();
        (providers.gemini_keys.clone(), providers.text_model.clone())
    };

    let law = req
        .law_name
        .clone()
        .unwrap_or_else(|| "um texto legal".to_string());

    let options = state.invoke_options(ChunkPolicy::with_boundary(MAX_BYTES, BOUNDARY));
    let result = invoke(
        &state.transport,
        &req.text,
        &keys,
        &options,
        |chunk, position| gemini::text_request(&model, &chunk_prompt(chunk, position, &law)),
        gemini::extract_text,
    )
    .await;

    match result {
        Ok(parts) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "summary": parts.join("\n\n"),
                "chunks": parts.len(),
                "model": model,
                "generatedAt": chrono::Utc::now().to_rfc3339(),
            })),
        ),
        Err(err) => invoke_error_response(err),
    }
}
