//! Anchoring Batcher (spec §4.6): a long-running worker that leases jobs,
//! calls the Ledger Client, reconciles status, and handles retries and
//! dead-lettering. Graceful shutdown follows the teacher's `SigDown`
//! pattern: the current in-flight item is allowed to complete, and no new
//! leases are acquired once cancellation is observed.

use crate::error::LedgerError;
use crate::ledger::{unix_seconds_to_iso, LedgerClient};
use crate::model::QueueItem;
use crate::store::Store;
use crate::store::queue::WorkQueue;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct BatcherConfig {
    pub batch_limit: u32,
    pub active_poll_interval: Duration,
    pub idle_poll_interval: Duration,
    pub idle_threshold: Duration,
}

pub struct Batcher {
    store: Store,
    queue: WorkQueue,
    ledger: LedgerClient,
    config: BatcherConfig,
}

impl Batcher {
    pub fn new(store: Store, queue: WorkQueue, ledger: LedgerClient, config: BatcherConfig) -> Self {
        Self {
            store,
            queue,
            ledger,
            config,
        }
    }

    /// Main loop: drains up to `BATCH_LIMIT` items per tick, then sleeps.
    /// Consecutive empty polls beyond `idle_threshold` back off to the
    /// idle cadence; a non-empty batch returns to active cadence
    /// immediately.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut idle_elapsed = Duration::ZERO;
        loop {
            if shutdown.is_cancelled() {
                tracing::info!("batcher shutting down, no new leases will be acquired");
                return;
            }

            let processed = self.drain_batch(&shutdown).await;

            if processed > 0 {
                idle_elapsed = Duration::ZERO;
            } else {
                idle_elapsed += self.config.active_poll_interval;
            }

            let sleep_for = if idle_elapsed >= self.config.idle_threshold {
                self.config.idle_poll_interval
            } else {
                self.config.active_poll_interval
            };

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = shutdown.cancelled() => {
                    tracing::info!("batcher shutting down during poll sleep");
                    return;
                }
            }
        }
    }

    /// Leases and processes up to `batch_limit` items sequentially,
    /// returning how many were leased. A leased item is always processed
    /// to completion even if shutdown is requested mid-batch (the
    /// in-flight item finishes; no further items are leased).
    async fn drain_batch(&self, shutdown: &CancellationToken) -> u32 {
        let mut processed = 0;
        for _ in 0..self.config.batch_limit {
            if shutdown.is_cancelled() {
                break;
            }
            match self.queue.lease_one().await {
                Ok(Some(item)) => {
                    processed += 1;
                    self.process_item(item).await;
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::error!(error = %err, "failed to lease queue item");
                    break;
                }
            }
        }
        processed
    }

    /// Processes a single leased item per the state machine in §4.6.
    async fn process_item(&self, item: QueueItem) {
        let public_id = item.public_id.clone();
        let public_hash = item.public_hash.clone();

        // Step 1: idempotency check — if already anchored, reconcile and
        // do not broadcast a new transaction.
        match self.ledger.is_anchored(&public_hash).await {
            Ok((true, block_ts)) => {
                let anchored_at = unix_seconds_to_iso(block_ts);
                self.reconcile_anchored(&public_id, "already-anchored", &anchored_at)
                    .await;
                return;
            }
            Ok((false, _)) => {}
            Err(err) => {
                tracing::warn!(public_id = %public_id, error = %err, "isAnchored check failed, proceeding to anchor");
            }
        }

        // Step 2: broadcast the anchor transaction and wait for a receipt.
        match self.ledger.anchor(&public_hash, &public_id, true).await {
            Ok(tx_hash) => {
                // §4.6 step 3: the receipt was just observed, so "now" is
                // an accurate anchored_at absent a per-block timestamp.
                let anchored_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
                self.reconcile_anchored(&public_id, &tx_hash, &anchored_at)
                    .await;
            }
            Err(err) => self.handle_ledger_error(&public_id, err).await,
        }
    }

    async fn reconcile_anchored(&self, public_id: &str, tx_hash: &str, anchored_at: &str) {
        if let Err(err) = self.queue.mark_already_anchored(public_id).await {
            tracing::error!(public_id, error = %err, "failed to mark queue item anchored");
        }
        if let Err(err) = self
            .store
            .mark_craftid_anchored(public_id, tx_hash, anchored_at)
            .await
        {
            tracing::error!(public_id, error = %err, "failed to reconcile craftid as anchored");
        }
    }

    /// §4.6 steps 4-5: permanent ledger errors dead-letter immediately;
    /// transient ones return the item to `queued` if retries remain.
    async fn handle_ledger_error(&self, public_id: &str, err: LedgerError) {
        let permanent = err.is_permanent();
        let reason = err.to_string();
        if let Err(queue_err) = self.queue.mark_failed(public_id, &reason, permanent).await {
            tracing::error!(public_id, error = %queue_err, "failed to record queue failure");
        }
        if permanent {
            if let Err(store_err) = self.store.mark_craftid_failed(public_id, &reason).await {
                tracing::error!(public_id, error = %store_err, "failed to mirror permanent failure to craftid");
            }
        }
    }
}
