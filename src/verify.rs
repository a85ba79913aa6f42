//! Verification Handler (spec §4.7): `GET /verify/{public_id}`.

use crate::error::VerifyError;
use crate::handlers::AppState;
use crate::hash::compute_public_hash;
use crate::ledger::unix_seconds_to_iso;
use crate::model::{CraftStatus, VerificationStatus};
use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub public_id: String,
    pub status: VerificationStatus,
    pub stored_hash: String,
    pub computed_hash: String,
    pub is_tampered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchored_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_timestamp: Option<String>,
    pub details: Value,
}

/// `GET /verify/{public_id}` — see §4.7 for the numbered algorithm this
/// function implements.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
) -> Result<Json<VerifyResponse>, VerifyError> {
    // Step 1: load the record.
    let record = state
        .store
        .find_craftid(&public_id)
        .await?
        .ok_or(VerifyError::NotFound)?;

    // Step 2: recompute the hash from the currently stored submission.
    let computed_hash = compute_public_hash(
        &record.original_submission.artisan,
        &record.original_submission.art,
        &record.timestamp,
        &record.salt,
    );

    // Step 3: tamper detection.
    let metadata_tampered = record.public_hash != computed_hash;

    // Step 4: consult the ledger when the record claims to be anchored.
    let mut on_chain = false;
    let mut block_ts_iso: Option<String> = None;
    let mut blockchain_verified = false;
    if record.status == CraftStatus::Anchored && record.tx_hash.is_some() {
        match state.ledger.is_anchored(&record.public_hash).await {
            Ok((exists, block_ts)) => {
                on_chain = exists;
                blockchain_verified = exists;
                if exists {
                    block_ts_iso = Some(unix_seconds_to_iso(block_ts));
                }
            }
            Err(err) => {
                tracing::warn!(public_id = %public_id, error = %err, "ledger lookup failed during verification");
            }
        }
    }

    // Step 5: classify.
    let status = if metadata_tampered {
        VerificationStatus::Tampered
    } else if record.status == CraftStatus::Failed {
        VerificationStatus::Failed
    } else if on_chain {
        VerificationStatus::Anchored
    } else {
        VerificationStatus::Pending
    };

    let details = json!({
        "blockchain_verified": blockchain_verified,
        "last_error": record.last_error,
    });

    // Step 6: respond.
    Ok(Json(VerifyResponse {
        public_id: record.public_id,
        status,
        stored_hash: record.public_hash,
        computed_hash,
        is_tampered: metadata_tampered,
        tx_hash: record.tx_hash,
        anchored_at: record.anchored_at,
        blockchain_timestamp: block_ts_iso,
        details,
    }))
}
