//! `POST /init-db` — optional, idempotent admin trigger (spec §6) that
//! creates the indexes described in "Persistent state layout".

use crate::handlers::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;

pub async fn init_db(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.store.init_indexes(&state.anchor_queue_coll).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(err) => {
            tracing::error!(error = %err, "failed to initialize indexes");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "failed to initialize indexes" })),
            )
        }
    }
}
