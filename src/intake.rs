//! Intake Handler (spec §4.5): `POST /create`.
//!
//! Each step is bounded by a per-operation timeout and observable via
//! tracing; the handler never waits on the ledger (§4.5, §9: retries live
//! in the Batcher, not request handlers).

use crate::error::IntakeError;
use crate::handlers::AppState;
use crate::hash::compute_public_hash;
use crate::model::{Attestation, AttestationPayload, CraftIdRecord, CraftStatus, Submission};
use axum::Json;
use axum::extract::State;
use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub artisan: crate::model::Artisan,
    pub art: crate::model::Art,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub status: &'static str,
    pub transaction_id: String,
    pub timestamp: String,
    pub verification: VerificationEnvelope,
}

#[derive(Debug, Serialize)]
pub struct VerificationEnvelope {
    pub public_id: String,
    pub public_hash: String,
    pub attestation: Attestation,
    pub verification_url: String,
    pub qr_code_link: String,
}

fn random_salt_hex() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn utc_now_second_precision_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// `POST /create` — see §4.5 for the full numbered step sequence this
/// function implements in order.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRequest>,
) -> Result<Json<CreateResponse>, IntakeError> {
    let art_name_norm = req.art.name.trim().to_lowercase();
    if art_name_norm.is_empty() {
        return Err(IntakeError::Validation("art.name is required".into()));
    }

    // Step 1: uniqueness check.
    if state.store.art_name_exists(&art_name_norm).await? {
        return Err(IntakeError::DuplicateName(req.art.name.clone()));
    }

    // Step 2: allocate public_id from the monotonic counter.
    let public_id = state.store.next_public_id().await?;

    // Step 3: generate salt and timestamp.
    let salt = state
        .default_salt
        .clone()
        .unwrap_or_else(random_salt_hex);
    let timestamp = utc_now_second_precision_iso();

    // Step 4: compute the canonical public hash.
    let public_hash = compute_public_hash(&req.artisan, &req.art, &timestamp, &salt);

    // Step 5: build and sign the attestation payload.
    let payload = AttestationPayload {
        public_id: public_id.clone(),
        public_hash: public_hash.clone(),
        timestamp: timestamp.clone(),
        salt: salt.clone(),
    };
    let signature = state.signer.sign(&payload)?;
    let attestation = Attestation {
        payload: payload.clone(),
        signature,
    };

    // Step 6: insert the CraftID record as queued.
    let record = CraftIdRecord {
        public_id: public_id.clone(),
        art_name_norm,
        original_submission: Submission {
            artisan: req.artisan,
            art: req.art,
        },
        timestamp: timestamp.clone(),
        salt,
        public_hash: public_hash.clone(),
        attestation: attestation.clone(),
        status: CraftStatus::Queued,
        tx_hash: None,
        anchored_at: None,
        last_error: None,
    };
    state.store.insert_craftid(&record).await?;

    // Step 7: enqueue the anchor job. Roll back the CraftID insert on
    // failure to keep the two collections in lockstep (§14 Open Question
    // Decision #1 in SPEC_FULL.md).
    if let Err(err) = state.queue.enqueue(&public_id, &public_hash).await {
        if let Err(rollback_err) = state.store.delete_craftid(&public_id).await {
            tracing::error!(
                public_id = %public_id,
                error = %rollback_err,
                "failed to roll back craftid after enqueue failure"
            );
        }
        return Err(err.into());
    }

    // Step 8: best-effort similarity-index side-write; never blocks or
    // fails the request.
    state
        .similarity
        .index(
            &public_id,
            &record.original_submission.art.name,
            record.original_submission.art.photo_url.as_deref(),
        )
        .await;

    // Step 9: respond with the attestation and verification links.
    let verification_url = format!("{}/verify/{public_id}", state.public_base_url);
    Ok(Json(CreateResponse {
        status: "success",
        transaction_id: public_id.clone(),
        timestamp,
        verification: VerificationEnvelope {
            public_id,
            public_hash,
            attestation,
            qr_code_link: format!("{verification_url}?format=qr"),
            verification_url,
        },
    }))
}

/// Health check, mirroring the teacher's `/health` endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
