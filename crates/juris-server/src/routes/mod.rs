//! HTTP route handlers — matches the API surface the study app frontend expects.

pub mod audio;
pub mod explain;
pub mod flashcards;
pub mod ocr;
pub mod status;
pub mod summary;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use juris_invoke::InvokeError;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(status::routes())
        .merge(explain::routes())
        .merge(flashcards::routes())
        .merge(summary::routes())
        .merge(audio::routes())
        .merge(ocr::routes())
}

/// Map an invoker failure to the `{success:false, error}` wire shape.
/// A missing credential pool is an operator problem (503); everything
/// else is a plain 500 for the frontend to surface as a toast.
pub fn invoke_error_response(err: InvokeError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        InvokeError::NoCredentialsConfigured => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "error": err.to_string(),
        })),
    )
}
