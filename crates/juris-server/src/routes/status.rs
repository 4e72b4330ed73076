//! Status route — provider availability, no key material.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let providers = state.providers.read();
    let status = providers.to_status();

    Json(serde_json::json!({
        "available": status.gemini_keys_configured > 0,
        "providers": status,
        "attemptTimeoutSecs": state.config.attempt_timeout_secs,
        "invocationDeadlineSecs": state.config.invocation_deadline_secs,
    }))
}
