//! Best-effort similarity-index side-write (spec §1 Non-goals, §4.5 step 8,
//! SPEC_FULL §12). The actual vector index is out of scope; this module
//! only carries the seam so the intake handler can depend on a trait
//! instead of an external client, keeping the call non-blocking and
//! failure-isolated from the main `/create` path.

use async_trait::async_trait;

/// Anything that can accept a best-effort indexing hint for a newly
/// created CraftID. Errors are logged by callers, never propagated to the
/// HTTP response.
#[async_trait]
pub trait SimilarityIndexer: Send + Sync {
    async fn index(&self, public_id: &str, art_name: &str, photo_url: Option<&str>);
}

/// Default indexer: logs and returns immediately. Swapping in a real
/// vector-index client (Pinecone, pgvector, etc.) means implementing this
/// trait — the intake handler does not change.
pub struct NoopSimilarityIndexer;

#[async_trait]
impl SimilarityIndexer for NoopSimilarityIndexer {
    async fn index(&self, public_id: &str, art_name: &str, _photo_url: Option<&str>) {
        tracing::debug!(public_id, art_name, "similarity index side-write skipped (noop)");
    }
}
