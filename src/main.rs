//! CraftID Anchoring Pipeline entrypoint.
//!
//! This binary launches an Axum-based HTTP server exposing the intake and
//! verification surface for the CraftID anchoring pipeline, and drives the
//! Anchoring Batcher as a background task sharing the same shutdown signal.
//!
//! Endpoints:
//! - `POST /create` – register a CraftID submission, return a signed attestation
//! - `GET /verify/{public_id}` – recompute the hash and classify tamper/anchoring status
//! - `POST /init-db` – idempotent index creation
//! - `GET /health` – liveness check
//!
//! This server includes:
//! - OpenTelemetry tracing via `TraceLayer`
//! - CORS support for cross-origin clients
//! - A background Anchoring Batcher sharing the HTTP server's shutdown signal
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `HOST`, `PORT` control binding address
//! - see `src/config.rs` for the full environment variable surface
//! - `OTEL_*` variables enable tracing export

mod admin;
mod batcher;
mod config;
mod error;
mod handlers;
mod hash;
mod intake;
mod ledger;
mod model;
mod signer;
mod similarity;
mod store;
mod util;
mod verify;

use axum::Router;
use axum::http::Method;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors;

use crate::batcher::{Batcher, BatcherConfig};
use crate::config::Config;
use crate::handlers::AppState;
use crate::ledger::{LedgerClient, LedgerConfig};
use crate::signer::AttestationSigner;
use crate::similarity::NoopSimilarityIndexer;
use crate::store::Store;
use crate::store::queue::WorkQueue;
use crate::util::{SigDown, Telemetry};

/// Initializes the CraftID anchoring pipeline process.
///
/// - Loads `.env` variables.
/// - Initializes OpenTelemetry tracing.
/// - Connects to MongoDB and the EVM ledger, loads the attestation signer.
/// - Spawns the Anchoring Batcher as a background task.
/// - Starts an Axum HTTP server with the intake/verification handlers.
///
/// Binds to the address specified by the `HOST` and `PORT` env vars.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "configuration error, exiting");
            std::process::exit(1);
        }
    };

    let store = Store::connect(&config.mongo_uri, &config.db_name).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to connect to MongoDB, exiting");
        std::process::exit(1);
    });

    let signer = AttestationSigner::load(&config.signer_key_path, &config.platform_pubkey_path)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to load attestation signer, exiting");
            std::process::exit(1);
        });

    let ledger = LedgerClient::new(LedgerConfig {
        rpc_url: config.web3_rpc_url.clone(),
        contract_address: config.anchor_contract_address,
        chain_id: config.chain_id,
        gas_limit: config.web3_gas_limit,
        receipt_timeout: config.web3_receipt_timeout,
        signer: config.anchorer_signer.clone(),
    })
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to construct ledger client, exiting");
        std::process::exit(1);
    });

    let queue = WorkQueue::new(
        store.queue(&config.anchor_queue_coll),
        config.visibility_timeout,
        config.max_retries,
    );

    let sig_down = SigDown::try_new()?;

    let batcher = Batcher::new(
        store.clone(),
        WorkQueue::new(
            store.queue(&config.anchor_queue_coll),
            config.visibility_timeout,
            config.max_retries,
        ),
        LedgerClient::new(LedgerConfig {
            rpc_url: config.web3_rpc_url.clone(),
            contract_address: config.anchor_contract_address,
            chain_id: config.chain_id,
            gas_limit: config.web3_gas_limit,
            receipt_timeout: config.web3_receipt_timeout,
            signer: config.anchorer_signer.clone(),
        })
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to construct batcher ledger client, exiting");
            std::process::exit(1);
        }),
        BatcherConfig {
            batch_limit: config.batch_limit,
            active_poll_interval: config.active_poll_interval,
            idle_poll_interval: config.idle_poll_interval,
            idle_threshold: config.idle_threshold,
        },
    );
    let batcher_shutdown = sig_down.cancellation_token();
    let batcher_handle = tokio::spawn(batcher.run(batcher_shutdown));

    let app_state = Arc::new(AppState {
        store,
        queue,
        ledger,
        signer,
        similarity: Arc::new(NoopSimilarityIndexer),
        anchor_queue_coll: config.anchor_queue_coll.clone(),
        default_salt: config.default_salt.clone(),
        public_base_url: format!("http://{}:{}", config.host, config.port),
    });

    let http_endpoints = Router::new()
        .merge(handlers::routes().with_state(app_state))
        .layer(telemetry.http_tracing())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap_or_else(|e| {
        tracing::error!("Failed to bind to {}: {}", addr, e);
        std::process::exit(1);
    });

    let axum_cancellation_token = sig_down.cancellation_token();
    let axum_graceful_shutdown = async move { axum_cancellation_token.cancelled().await };
    axum::serve(listener, http_endpoints)
        .with_graceful_shutdown(axum_graceful_shutdown)
        .await?;

    batcher_handle.await.ok();

    Ok(())
}
