//! Best-effort mirroring of local mutations to the record store.
//!
//! Local state is authoritative. Each write is attempted once; a failed write
//! is logged and parked in the outbox until `flush()` replays it. Writes the
//! store rejects for good (the record is gone) are logged and dropped.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;

use super::clock::Clock;
use super::models::Timestamp;
use super::remote::{Collection, ListQuery, Record, RecordStore};
use crate::errors::RemoteError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    Create { record: Value },
    Update { id: String, patch: Value },
    Delete { id: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWrite {
    pub collection: Collection,
    #[serde(flatten)]
    pub op: WriteOp,
    pub error: String,
    pub failed_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushReport {
    pub replayed: usize,
    pub dropped: usize,
    pub still_pending: usize,
}

pub struct RemoteMirror {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    outbox: Vec<PendingWrite>,
}

impl RemoteMirror {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            outbox: Vec::new(),
        }
    }

    /// Fetch and decode one collection.
    pub async fn list<R: Record>(&self, query: &ListQuery) -> Result<Vec<R>, RemoteError> {
        let values = self.store.list(R::COLLECTION, query).await?;
        values
            .into_iter()
            .map(|v| {
                serde_json::from_value(v).map_err(|e| RemoteError::Decode {
                    collection: R::COLLECTION.to_string(),
                    source: e,
                })
            })
            .collect()
    }

    pub async fn create<R: Record>(&mut self, record: &R) -> bool {
        let value = match serde_json::to_value(record) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(collection = %R::COLLECTION, error = %e, "Failed to encode record");
                return false;
            }
        };
        let op = WriteOp::Create { record: value };
        self.attempt(R::COLLECTION, op).await
    }

    pub async fn update(&mut self, collection: Collection, id: &str, patch: Value) -> bool {
        let op = WriteOp::Update {
            id: id.to_string(),
            patch,
        };
        self.attempt(collection, op).await
    }

    pub async fn delete(&mut self, collection: Collection, id: &str) -> bool {
        let op = WriteOp::Delete { id: id.to_string() };
        self.attempt(collection, op).await
    }

    /// Delete a batch of records concurrently. Returns how many succeeded.
    pub async fn delete_many(&mut self, collection: Collection, ids: &[String]) -> usize {
        let store = self.store.clone();
        let results = join_all(ids.iter().map(|id| {
            let store = store.clone();
            async move { (id.clone(), store.delete(collection, id).await) }
        }))
        .await;

        let mut succeeded = 0;
        for (id, result) in results {
            match result {
                Ok(()) => succeeded += 1,
                Err(e) => self.park(collection, WriteOp::Delete { id }, e),
            }
        }
        succeeded
    }

    pub fn pending(&self) -> &[PendingWrite] {
        &self.outbox
    }

    /// Drop queued writes, e.g. when the session they belong to ends.
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.outbox.len();
        self.outbox.clear();
        dropped
    }

    /// Replay queued writes in order. Writes that fail again stay queued
    /// unless the failure is permanent.
    pub async fn flush(&mut self) -> FlushReport {
        let queued = std::mem::take(&mut self.outbox);
        let mut report = FlushReport::default();
        for write in queued {
            match self.execute(write.collection, &write.op).await {
                Ok(()) => report.replayed += 1,
                Err(e) if !e.is_retryable() => {
                    tracing::warn!(collection = %write.collection, error = %e, "Dropping queued write");
                    report.dropped += 1;
                }
                Err(e) => {
                    tracing::debug!(collection = %write.collection, error = %e, "Replay failed");
                    self.outbox.push(PendingWrite {
                        error: e.to_string(),
                        failed_at: self.clock.now(),
                        ..write
                    });
                }
            }
        }
        report.still_pending = self.outbox.len();
        if report.replayed > 0 || report.dropped > 0 {
            tracing::info!(
                replayed = report.replayed,
                dropped = report.dropped,
                still_pending = report.still_pending,
                "Flushed pending record store writes"
            );
        }
        report
    }

    async fn attempt(&mut self, collection: Collection, op: WriteOp) -> bool {
        match self.execute(collection, &op).await {
            Ok(()) => true,
            Err(e) => {
                self.park(collection, op, e);
                false
            }
        }
    }

    async fn execute(&self, collection: Collection, op: &WriteOp) -> Result<(), RemoteError> {
        match op {
            WriteOp::Create { record } => self.store.create(collection, record).await,
            WriteOp::Update { id, patch } => self.store.update(collection, id, patch).await,
            WriteOp::Delete { id } => self.store.delete(collection, id).await,
        }
    }

    fn park(&mut self, collection: Collection, op: WriteOp, error: RemoteError) {
        if !error.is_retryable() {
            tracing::warn!(
                collection = %collection,
                error = %error,
                "Record store rejected write, dropping it"
            );
            return;
        }
        tracing::warn!(
            collection = %collection,
            error = %error,
            "Record store write failed, continuing with local state"
        );
        self.outbox.push(PendingWrite {
            collection,
            op,
            error: error.to_string(),
            failed_at: self.clock.now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::clock::ManualClock;
    use crate::board::remote::MemoryRecordStore;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
        ))
    }

    fn mirror_over(store: &Arc<MemoryRecordStore>) -> RemoteMirror {
        RemoteMirror::new(store.clone(), clock())
    }

    #[tokio::test]
    async fn test_successful_write_leaves_outbox_empty() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut mirror = mirror_over(&store);
        store
            .create(Collection::Tasks, &json!({"id": "t1", "title": "a"}))
            .await
            .unwrap();
        assert!(mirror.update(Collection::Tasks, "t1", json!({"title": "b"})).await);
        assert!(mirror.pending().is_empty());
        assert_eq!(store.records(Collection::Tasks)[0]["title"], "b");
    }

    #[tokio::test]
    async fn test_write_to_missing_record_is_dropped_not_parked() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut mirror = mirror_over(&store);
        assert!(
            !mirror
                .update(Collection::Tasks, "task-1", json!({"columnId": "col-2"}))
                .await
        );
        assert!(mirror.pending().is_empty());
    }

    #[tokio::test]
    async fn test_flush_drops_writes_whose_record_is_gone() {
        let store = Arc::new(MemoryRecordStore::offline());
        let mut mirror = mirror_over(&store);
        assert!(
            !mirror
                .update(Collection::Tasks, "task-1", json!({"columnId": "col-2"}))
                .await
        );
        assert_eq!(mirror.pending().len(), 1);

        // Back online, but nobody ever created task-1.
        store.set_available(true);
        let report = mirror.flush().await;
        assert_eq!(
            report,
            FlushReport {
                replayed: 0,
                dropped: 1,
                still_pending: 0
            }
        );
        assert_eq!(mirror.flush().await, FlushReport::default());
    }

    #[tokio::test]
    async fn test_failed_writes_are_parked_and_flushed_in_order() {
        let store = Arc::new(MemoryRecordStore::offline());
        let mut mirror = mirror_over(&store);

        assert!(!mirror.delete(Collection::Boards, "b0").await);
        assert!(
            !mirror
                .update(Collection::Boards, "b1", json!({"title": "renamed"}))
                .await
        );
        assert_eq!(mirror.pending().len(), 2);
        assert!(matches!(mirror.pending()[0].op, WriteOp::Delete { .. }));

        // Still offline: nothing replays.
        let report = mirror.flush().await;
        assert_eq!(report.replayed, 0);
        assert_eq!(report.still_pending, 2);

        store.set_available(true);
        store
            .create(Collection::Boards, &json!({"id": "b1", "title": "old"}))
            .await
            .unwrap();
        let report = mirror.flush().await;
        assert_eq!(
            report,
            FlushReport {
                replayed: 2,
                dropped: 0,
                still_pending: 0
            }
        );
        assert_eq!(store.records(Collection::Boards)[0]["title"], "renamed");
    }

    #[tokio::test]
    async fn test_failure_time_comes_from_the_clock() {
        let store = Arc::new(MemoryRecordStore::offline());
        let clock = clock();
        let mut mirror = RemoteMirror::new(store, clock.clone());

        mirror.delete(Collection::Columns, "c1").await;
        assert_eq!(mirror.pending()[0].failed_at, clock.now());

        clock.advance(Duration::minutes(10));
        mirror.flush().await;
        assert_eq!(mirror.pending()[0].failed_at, clock.now());
    }

    #[tokio::test]
    async fn test_delete_many_parks_only_failures() {
        let store = Arc::new(MemoryRecordStore::offline());
        let mut mirror = mirror_over(&store);
        let ids = vec!["s1".to_string(), "s2".to_string()];
        assert_eq!(mirror.delete_many(Collection::Subtasks, &ids).await, 0);
        assert_eq!(mirror.pending().len(), 2);
    }

    #[tokio::test]
    async fn test_pending_write_serializes_flat() {
        let store = Arc::new(MemoryRecordStore::offline());
        let mut mirror = mirror_over(&store);
        mirror.delete(Collection::Tasks, "t9").await;
        let value = serde_json::to_value(&mirror.pending()[0]).unwrap();
        assert_eq!(value["collection"], "tasks");
        assert_eq!(value["op"], "delete");
        assert_eq!(value["id"], "t9");
        assert!(value["error"].as_str().unwrap().contains("offline"));
    }
}
