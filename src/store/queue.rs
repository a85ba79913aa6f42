//! Work Queue (spec §4.4): a lease-based FIFO of pending anchor jobs
//! backed by the `anchor_queue` collection. The atomic find-and-modify
//! behind [`WorkQueue::lease_one`] is the sole synchronization point
//! across concurrent Batcher workers (§5).

use crate::error::StoreError;
use crate::model::{QueueItem, QueueStatus};
use bson::{DateTime as BsonDateTime, doc};
use mongodb::Collection;
use mongodb::options::ReturnDocument;
use std::time::Duration;

const OP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct WorkQueue {
    collection: Collection<QueueItem>,
    visibility_timeout: Duration,
    max_retries: i32,
}

impl WorkQueue {
    pub fn new(collection: Collection<QueueItem>, visibility_timeout: Duration, max_retries: i32) -> Self {
        Self {
            collection,
            visibility_timeout,
            max_retries,
        }
    }

    /// Inserts a new item in `status=queued`, `tries=0`, `locked_until=null`.
    /// Duplicate `public_id` is rejected by the unique index (§4.4).
    pub async fn enqueue(&self, public_id: &str, public_hash: &str) -> Result<(), StoreError> {
        let item = QueueItem {
            public_id: public_id.to_string(),
            public_hash: public_hash.to_string(),
            created_at: BsonDateTime::now(),
            status: QueueStatus::Queued,
            tries: 0,
            locked_until: None,
            last_error: None,
            last_try: None,
        };
        self.collection
            .insert_one(&item)
            .await
            .map_err(|e| match *e.kind {
                mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(
                    ref we,
                )) if we.code == 11000 => StoreError::Duplicate,
                _ => StoreError::Database(e),
            })?;
        Ok(())
    }

    /// Atomically selects the oldest eligible item — `queued`, or
    /// `processing` with an expired lease — and transitions it to
    /// `processing` under a fresh lease, incrementing `tries`.
    pub async fn lease_one(&self) -> Result<Option<QueueItem>, StoreError> {
        let now = BsonDateTime::now();
        let locked_until = BsonDateTime::from_millis(
            now.timestamp_millis() + self.visibility_timeout.as_millis() as i64,
        );

        let filter = doc! {
            "$or": [
                { "status": "queued" },
                { "status": "processing", "locked_until": { "$lt": now } },
            ]
        };
        let update = doc! {
            "$set": {
                "status": "processing",
                "locked_until": locked_until,
                "last_try": now,
            },
            "$inc": { "tries": 1_i32 },
        };

        let item = self
            .collection
            .find_one_and_update(filter, update)
            .sort(doc! { "created_at": 1 })
            .return_document(ReturnDocument::After)
            .max_time(OP_TIMEOUT)
            .await?;
        Ok(item)
    }

    /// Marks the item as terminally anchored. Only applies when the item
    /// is currently `processing`, guarding against a late completion by a
    /// worker whose lease was already reclaimed (§4.4).
    pub async fn mark_done(&self, public_id: &str) -> Result<(), StoreError> {
        self.collection
            .update_one(
                doc! { "public_id": public_id, "status": "processing" },
                doc! { "$set": { "status": "anchored" }, "$unset": { "locked_until": "" } },
            )
            .await?;
        Ok(())
    }

    /// Reconciles an item already observed anchored on-chain without this
    /// worker having broadcast it (§4.6 step 1 idempotency check) — same
    /// effect as [`Self::mark_done`], named separately for call-site clarity.
    pub async fn mark_already_anchored(&self, public_id: &str) -> Result<(), StoreError> {
        self.mark_done(public_id).await
    }

    /// Applies a failure. If `permanent` or the retry ceiling is reached,
    /// dead-letters the item (`status=failed`); otherwise returns it to
    /// `queued`, preserving `tries`. Only transitions items currently
    /// `processing`.
    pub async fn mark_failed(
        &self,
        public_id: &str,
        reason: &str,
        permanent: bool,
    ) -> Result<(), StoreError> {
        let now = BsonDateTime::now();
        let item = self
            .collection
            .find_one(doc! { "public_id": public_id, "status": "processing" })
            .await?;
        let Some(item) = item else {
            return Ok(());
        };

        let dead_letter = permanent || item.tries >= self.max_retries;
        let new_status = if dead_letter { "failed" } else { "queued" };

        self.collection
            .update_one(
                doc! { "public_id": public_id, "status": "processing" },
                doc! {
                    "$set": {
                        "status": new_status,
                        "last_error": reason,
                        "last_try": now,
                    },
                    "$unset": { "locked_until": "" },
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pure transition logic, exercised without a live MongoDB: the
    /// dead-letter decision is `permanent || tries >= max_retries`.
    fn should_dead_letter(permanent: bool, tries: i32, max_retries: i32) -> bool {
        permanent || tries >= max_retries
    }

    #[test]
    fn retries_below_ceiling_requeue() {
        assert!(!should_dead_letter(false, 4, 5));
    }

    #[test]
    fn retry_ceiling_dead_letters() {
        assert!(should_dead_letter(false, 5, 5));
    }

    #[test]
    fn permanent_failure_dead_letters_regardless_of_tries() {
        assert!(should_dead_letter(true, 0, 5));
    }
}
