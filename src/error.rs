//! Closed error taxonomy for the anchoring pipeline.
//!
//! Each class maps to the policy in spec §7: validation errors are 4xx and
//! never retried, configuration errors are fatal at startup, transient
//! infrastructure errors are retried at the queue layer, and permanent
//! ledger errors are dead-lettered immediately. No variant's `Display`
//! impl ever includes key material, file contents, or a secret path.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Fatal at process startup: missing/unreadable secret material, an
/// unparsable config file, or an unreachable database.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
    #[error("failed to read key material from disk")]
    UnreadableKey,
    #[error("failed to connect to MongoDB: {0}")]
    Database(#[from] mongodb::error::Error),
}

/// Errors surfaced by the Primary Store / Work Queue.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database operation failed")]
    Database(#[from] mongodb::error::Error),
    #[error("document encoding failed")]
    Encoding(#[from] bson::ser::Error),
    #[error("document decoding failed")]
    Decoding(#[from] bson::de::Error),
    #[error("duplicate key")]
    Duplicate,
    #[error("operation timed out")]
    Timeout,
}

impl StoreError {
    /// True when the failure is transient infrastructure (retryable),
    /// false when it reflects a data invariant (duplicate key).
    pub fn is_transient(&self) -> bool {
        !matches!(self, StoreError::Duplicate)
    }
}

/// Attestation signer failures (§4.2). Never carries key bytes.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("signer key material is unset or unreadable")]
    KeyUnavailable,
    #[error("malformed signature hex")]
    MalformedHex,
    #[error("signature mismatch")]
    Mismatch,
    #[error("payload serialization failed")]
    Serialization(#[from] serde_json::Error),
}

/// Ledger client failure taxonomy (§4.3).
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("receipt not observed within timeout")]
    ReceiptTimeout,
    #[error("transaction reverted")]
    TxRejected,
    #[error("transport or RPC failure: {0}")]
    Transport(String),
}

impl LedgerError {
    /// Permanent failures dead-letter immediately; all others are retried
    /// at the queue layer up to `MAX_RETRIES`.
    pub fn is_permanent(&self) -> bool {
        matches!(self, LedgerError::InvalidInput(_) | LedgerError::TxRejected)
    }
}

/// Errors surfaced by the `POST /create` handler.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("an art name identical to \"{0}\" is already registered")]
    DuplicateName(String),
    #[error("invalid submission: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Signer(#[from] SignerError),
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            IntakeError::DuplicateName(_) => (StatusCode::CONFLICT, self.to_string()),
            IntakeError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            IntakeError::Store(_) | IntakeError::Signer(_) => {
                tracing::error!(error = %self, "intake failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error processing submission".to_string(),
                )
            }
        };
        (status, Json(json!({ "status": "error", "message": message }))).into_response()
    }
}

/// Errors surfaced by the `GET /verify/{public_id}` handler.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("no CraftID found for the given public id")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for VerifyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            VerifyError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            VerifyError::Store(_) => {
                tracing::error!(error = %self, "verification lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error during verification".to_string(),
                )
            }
        };
        (status, Json(json!({ "status": "error", "message": message }))).into_response()
    }
}
