//! Record store seam: the generic keyed-collection backend the board mirrors
//! its writes to.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::models::{Board, Column, Subtask, Task};
use crate::errors::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Boards,
    Columns,
    Tasks,
    Subtasks,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boards => "boards",
            Self::Columns => "columns",
            Self::Tasks => "tasks",
            Self::Subtasks => "subtasks",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// `where` equality constraints plus an optional single-field ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filter: BTreeMap<String, Value>,
    pub order_by: Option<(String, SortOrder)>,
}

impl ListQuery {
    pub fn owned_by(owner_id: &str) -> Self {
        Self::default().where_eq("ownerId", owner_id)
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filter.insert(field.to_string(), value.into());
        self
    }

    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by = Some((field.to_string(), order));
        self
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.filter
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }

    /// Filter and order `records` in place.
    pub fn apply(&self, records: &mut Vec<Value>) {
        records.retain(|r| self.matches(r));
        if let Some((field, order)) = &self.order_by {
            records.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Shallow-merge the keys of `patch` into `record`.
pub fn merge_patch(record: &mut Value, patch: &Value) {
    if let (Some(target), Some(changes)) = (record.as_object_mut(), patch.as_object()) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// A remote backend holding one keyed collection per entity type.
///
/// Real implementations: `SqliteRecordStore`, `HttpRecordStore`.
/// Test double and offline fallback: `MemoryRecordStore`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, collection: Collection, query: &ListQuery)
    -> Result<Vec<Value>, RemoteError>;

    async fn create(&self, collection: Collection, record: &Value) -> Result<(), RemoteError>;

    async fn update(&self, collection: Collection, id: &str, patch: &Value)
    -> Result<(), RemoteError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError>;
}

/// Entity types that live in a record store collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

impl Record for Board {
    const COLLECTION: Collection = Collection::Boards;
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Column {
    const COLLECTION: Collection = Collection::Columns;
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Task {
    const COLLECTION: Collection = Collection::Tasks;
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Subtask {
    const COLLECTION: Collection = Collection::Subtasks;
    fn id(&self) -> &str {
        &self.id
    }
}

// ── In-memory store ───────────────────────────────────────────────────

/// One call observed by a `MemoryRecordStore`, e.g. `update tasks task-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub op: &'static str,
    pub collection: Collection,
    pub id: Option<String>,
}

/// In-process record store. Its availability can be switched off to simulate
/// an outage; every call is recorded either way.
#[derive(Default)]
pub struct MemoryRecordStore {
    collections: Mutex<HashMap<Collection, Vec<Value>>>,
    calls: Mutex<Vec<RecordedCall>>,
    offline: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every call until `set_available(true)`.
    pub fn offline() -> Self {
        let store = Self::default();
        store.set_available(false);
        store
    }

    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, AtomicOrdering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        !self.offline.load(AtomicOrdering::SeqCst)
    }

    /// Insert a typed record directly, bypassing availability.
    pub fn seed<R: Record>(&self, record: &R) -> Result<(), RemoteError> {
        let value = serde_json::to_value(record).map_err(|e| RemoteError::Decode {
            collection: R::COLLECTION.to_string(),
            source: e,
        })?;
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| RemoteError::LockPoisoned)?;
        collections.entry(R::COLLECTION).or_default().push(value);
        Ok(())
    }

    pub fn records(&self, collection: Collection) -> Vec<Value> {
        self.collections
            .lock()
            .map(|c| c.get(&collection).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record_call(
        &self,
        op: &'static str,
        collection: Collection,
        id: Option<&str>,
    ) -> Result<(), RemoteError> {
        self.calls
            .lock()
            .map_err(|_| RemoteError::LockPoisoned)?
            .push(RecordedCall {
                op,
                collection,
                id: id.map(str::to_string),
            });
        if self.is_available() {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("memory store is offline".into()))
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<Vec<Value>, RemoteError> {
        self.record_call("list", collection, None)?;
        let mut records = self.records(collection);
        query.apply(&mut records);
        Ok(records)
    }

    async fn create(&self, collection: Collection, record: &Value) -> Result<(), RemoteError> {
        let id = record.get("id").and_then(Value::as_str);
        self.record_call("create", collection, id)?;
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| RemoteError::LockPoisoned)?;
        collections.entry(collection).or_default().push(record.clone());
        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: &Value,
    ) -> Result<(), RemoteError> {
        self.record_call("update", collection, Some(id))?;
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| RemoteError::LockPoisoned)?;
        let record = collections
            .get_mut(&collection)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| RemoteError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        merge_patch(record, patch);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        self.record_call("delete", collection, Some(id))?;
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| RemoteError::LockPoisoned)?;
        if let Some(records) = collections.get_mut(&collection) {
            records.retain(|r| r.get("id").and_then(Value::as_str) != Some(id));
        }
        Ok(())
    }
}

/// A backend that is never reachable. Used when no store is configured so
/// the board always runs from local state.
pub struct UnavailableRecordStore;

#[async_trait]
impl RecordStore for UnavailableRecordStore {
    async fn list(&self, _: Collection, _: &ListQuery) -> Result<Vec<Value>, RemoteError> {
        Err(RemoteError::Unavailable("no record store configured".into()))
    }

    async fn create(&self, _: Collection, _: &Value) -> Result<(), RemoteError> {
        Err(RemoteError::Unavailable("no record store configured".into()))
    }

    async fn update(&self, _: Collection, _: &str, _: &Value) -> Result<(), RemoteError> {
        Err(RemoteError::Unavailable("no record store configured".into()))
    }

    async fn delete(&self, _: Collection, _: &str) -> Result<(), RemoteError> {
        Err(RemoteError::Unavailable("no record store configured".into()))
    }
}
