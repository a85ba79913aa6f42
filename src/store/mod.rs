//! Primary Store (spec §3, §6): the authoritative `craftids` collection
//! and the atomic monotonic `counters` collection. The Work Queue lives
//! in the same database and is implemented in [`queue`].

pub mod queue;

use crate::error::StoreError;
use crate::model::CraftIdRecord;
use bson::doc;
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;

const OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the document database. Constructed once at startup and
/// injected into the Intake handler, Batcher, and Verification handler —
/// no global mutable singleton (§9).
#[derive(Clone)]
pub struct Store {
    db: Database,
}

impl Store {
    /// Connects to MongoDB and selects the configured database. Connection
    /// failure here is a `ConfigError` at the call site (fatal at startup).
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, mongodb::error::Error> {
        let client = Client::with_uri_str(uri).await?;
        // Fail fast: verify connectivity before the process reports ready.
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(Self {
            db: client.database(db_name),
        })
    }

    pub fn craftids(&self) -> Collection<CraftIdRecord> {
        self.db.collection("craftids")
    }

    fn counters(&self) -> Collection<bson::Document> {
        self.db.collection("counters")
    }

    pub fn queue(&self, collection_name: &str) -> Collection<crate::model::QueueItem> {
        self.db.collection(collection_name)
    }

    /// Creates the indexes required by §6 "Persistent state layout". Safe
    /// to call repeatedly (idempotent), backing the `POST /init-db` admin
    /// endpoint.
    pub async fn init_indexes(&self, queue_collection: &str) -> Result<(), StoreError> {
        let craftids = self.craftids();
        craftids
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "public_id": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        craftids
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "art_name_norm": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        craftids
            .create_index(IndexModel::builder().keys(doc! { "public_hash": 1 }).build())
            .await?;

        let queue = self.queue(queue_collection);
        queue
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "public_id": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        queue
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "status": 1, "created_at": 1 })
                    .build(),
            )
            .await?;
        queue
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "status": 1, "locked_until": 1 })
                    .build(),
            )
            .await?;
        Ok(())
    }

    /// Allocates the next `public_id` from the monotonic `counters`
    /// collection via an atomic find-and-modify with upsert semantics
    /// (§4.5 step 2).
    pub async fn next_public_id(&self) -> Result<String, StoreError> {
        let doc = self
            .counters()
            .find_one_and_update(
                doc! { "_id": "craftid_seq" },
                doc! { "$inc": { "seq": 1_i64 } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .max_time(OP_TIMEOUT)
            .await?
            .expect("upsert guarantees a document");
        let seq = doc.get_i64("seq").unwrap_or(1);
        Ok(format!("CID-{seq:05}"))
    }

    /// §4.5 step 1: checks `art_name_norm` uniqueness.
    pub async fn art_name_exists(&self, art_name_norm: &str) -> Result<bool, StoreError> {
        let count = self
            .craftids()
            .count_documents(doc! { "art_name_norm": art_name_norm })
            .await?;
        Ok(count > 0)
    }

    pub async fn insert_craftid(&self, record: &CraftIdRecord) -> Result<(), StoreError> {
        self.craftids()
            .insert_one(record)
            .await
            .map_err(|e| match *e.kind {
                mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(
                    ref we,
                )) if we.code == 11000 => StoreError::Duplicate,
                _ => StoreError::Database(e),
            })?;
        Ok(())
    }

    pub async fn delete_craftid(&self, public_id: &str) -> Result<(), StoreError> {
        self.craftids()
            .delete_one(doc! { "public_id": public_id })
            .await?;
        Ok(())
    }

    pub async fn find_craftid(&self, public_id: &str) -> Result<Option<CraftIdRecord>, StoreError> {
        Ok(self
            .craftids()
            .find_one(doc! { "public_id": public_id })
            .await?)
    }

    /// Mirrors the Batcher's terminal write onto the CraftID record
    /// (§4.6 step 3: anchored success).
    pub async fn mark_craftid_anchored(
        &self,
        public_id: &str,
        tx_hash: &str,
        anchored_at: &str,
    ) -> Result<(), StoreError> {
        self.craftids()
            .update_one(
                doc! { "public_id": public_id },
                doc! { "$set": {
                    "status": "anchored",
                    "tx_hash": tx_hash,
                    "anchored_at": anchored_at,
                }},
            )
            .await?;
        Ok(())
    }

    /// Mirrors the Batcher's terminal write onto the CraftID record
    /// (§4.6 step 4: permanent failure, dead-lettered).
    pub async fn mark_craftid_failed(&self, public_id: &str, reason: &str) -> Result<(), StoreError> {
        self.craftids()
            .update_one(
                doc! { "public_id": public_id },
                doc! { "$set": { "status": "failed", "last_error": reason } },
            )
            .await?;
        Ok(())
    }
}
