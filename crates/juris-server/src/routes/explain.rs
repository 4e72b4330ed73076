//! Explain route — plain-language explanation of one legal article.

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

/// Articles are short; one call is always enough at this limit.
const MAX_BYTES: usize = 8_000;

#[derive(Debug, Clone, Deserialize)]
pub struct ExplainRequest {
    /// Full article text, e.g. "Art. 5º Todos são iguais perante a lei...".
    pub article: String,
    /// Law it belongs to, e.g. "Constituição Federal".
    #[serde(default, rename = "lawName")]
    pub law_name: Option<String>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/explain", post(explain))
}

async fn explain(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExplainRequest>,
) -> impl IntoResponse {
    let (keys, model) = {
        let providers = state.providers.read();
        (providers.gemini_keys.clone(), providers.text_model.clone())
    };

    let law = req.law_name.as_deref().unwrap_or("a legislação brasileira");
    let prompt = format!(
        "Você é um professor de direito preparando alunos para concursos. \
         Explique o artigo abaixo de {} em linguagem simples, com um exemplo \
         prático, sem omitir exceções relevantes.\n\n{}",
        law, req.article
    );

    let options = state.invoke_options(ChunkPolicy::new(MAX_BYTES));
    let result = invoke(
        &state.transport,
        &prompt,
        &keys,
        &options,
        |chunk, _| gemini::text_request(&model, chunk),
        gemini::extract_text,
    )
    .await;

    match result {
        Ok(parts) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "explanation": parts.concat(),
                "model": model,
                "generatedAt": chrono::Utc::now().to_rfc3339(),
            })),
        ),
        Err(err) => invoke_error_response(err),
    }
}
