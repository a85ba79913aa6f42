//! Data model for the CraftID anchoring pipeline (spec §3).
//!
//! Status fields are modeled as closed tagged variants per the REDESIGN
//! FLAGS in spec §9 ("string-typed status fields" → `{Queued, Processing,
//! Anchored, Failed}"), and serialize to lowercase strings at storage/API
//! edges via `serde`.

use bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

/// Artisan metadata as submitted at intake (spec §3, §4.1 input shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artisan {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub aadhaar_number: String,
}

/// Art metadata as submitted at intake. `photo_url` is carried in the
/// original submission for display purposes but is never hashed (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Art {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// The full submitted object as received, minus large binary media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub artisan: Artisan,
    pub art: Art,
}

/// The canonical attestation payload signed at intake (§4.2).
///
/// Field order here is cosmetic; canonicalization for signing re-serializes
/// with sorted keys via [`crate::hash::canonical_json`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationPayload {
    pub public_id: String,
    pub public_hash: String,
    pub timestamp: String,
    pub salt: String,
}

/// A signed attestation envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attestation {
    pub payload: AttestationPayload,
    pub signature: String,
}

/// Closed status for the authoritative CraftID record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftStatus {
    Queued,
    Anchored,
    Failed,
}

/// The authoritative CraftID record (spec §3, `craftids` collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftIdRecord {
    pub public_id: String,
    pub art_name_norm: String,
    pub original_submission: Submission,
    pub timestamp: String,
    pub salt: String,
    pub public_hash: String,
    pub attestation: Attestation,
    pub status: CraftStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchored_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Closed status for a work queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Processing,
    Anchored,
    Failed,
}

/// A work queue item (spec §3, `anchor_queue` collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub public_id: String,
    pub public_hash: String,
    pub created_at: BsonDateTime,
    pub status: QueueStatus,
    pub tries: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<BsonDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_try: Option<BsonDateTime>,
}

/// Tamper/anchoring classification returned by `/verify/{public_id}` (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Anchored,
    Tampered,
    Failed,
}
