//! Axum route wiring and the shared [`AppState`] injected into every
//! handler (spec §9: explicit constructors/DI, no global singletons).

use crate::ledger::LedgerClient;
use crate::signer::AttestationSigner;
use crate::similarity::SimilarityIndexer;
use crate::store::Store;
use crate::store::queue::WorkQueue;
use crate::{admin, intake, verify};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub struct AppState {
    pub store: Store,
    pub queue: WorkQueue,
    pub ledger: LedgerClient,
    pub signer: AttestationSigner,
    pub similarity: Arc<dyn SimilarityIndexer>,
    pub anchor_queue_coll: String,
    pub default_salt: Option<String>,
    pub public_base_url: String,
}

/// Assembles the HTTP surface: `/create`, `/verify/{public_id}`,
/// `/init-db`, `/health`, matching the teacher's flat `routes()` style.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(intake::create))
        .route("/verify/{public_id}", get(verify::verify))
        .route("/init-db", post(admin::init_db))
        .route("/health", get(intake::health))
}
