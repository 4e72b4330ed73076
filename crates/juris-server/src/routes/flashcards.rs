//! Flashcards route — question/answer cards from study text.

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

const MAX_BYTES: usize = 12_000;
const BOUNDARY: &str = "\n\n";

#[derive(Debug, Clone, Deserialize)]
pub struct FlashcardsRequest {
    pub text: String,
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    10
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/flashcards", post(flashcards))
}

/// Models wrap JSON answers in markdown fences more often than not.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

/// Parse one chunk's response into card objects; non-arrays are an
/// extraction failure so the invoker can rotate to the next credential.
fn parse_cards(raw: &str) -> Result<Vec<serde_json::Value>, String> {
    let cleaned = strip_code_fence(raw);
    let value: serde_json::Value =
        serde_json::from_str(cleaned).map_err(|e| format!("invalid card JSON: {}", e))?;
    match value {
        serde_json::Value::Array(cards) => Ok(cards),
        _ => Err("expected a JSON array of cards".into()),
    }
}

async fn flashcards(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FlashcardsRequest>,
) -> impl IntoResponse {
    let (keys, model) = {
        let providers = state.providers.read();
        (providers.gemini_keys.clone(), providers.text_model.clone())
    };

    let count = req.count.clamp(1, 30);

    let options = state.invoke_options(ChunkPolicy::with_boundary(MAX_BYTES, BOUNDARY));
    let result = invoke(
        &state.transport,
        &req.text,
        &keys,
        &options,
        |chunk, _| {
            let prompt = format!(
                "Gere até {} flashcards de estudo sobre o texto legal abaixo. \
                 Responda somente com um array JSON de objetos \
                 {{\"front\": pergunta, \"back\": resposta}}.\n\n{}",
                count, chunk
            );
            gemini::text_request(&model, &prompt)
        },
        |response| {
            let text = gemini::extract_text(response)?;
            parse_cards(&text)
        },
    )
    .await;

    match result {
        Ok(per_chunk) => {
            let mut cards: Vec<serde_json::Value> = per_chunk.into_iter().flatten().collect();
            cards.truncate(count);
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "success": true,
                    "cards": cards,
                    "model": model,
                })),
            )
        }
        Err(err) => invoke_error_response(err),
    }
}
