use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use super::remote::{Collection, ListQuery, RecordStore, merge_patch};
use crate::errors::RemoteError;

/// Async-safe handle to the record database.
///
/// Wraps `RecordDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, so synchronous SQLite I/O does
/// not tie up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<RecordDb>>,
}

impl DbHandle {
    pub fn new(db: RecordDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&RecordDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

/// Document-style storage: one row per record, body kept as JSON.
pub struct RecordDb {
    conn: Connection,
}

impl RecordDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.run_migrations().context("Failed to run migrations")?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.run_migrations().context("Failed to run migrations")?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS records (
                    collection TEXT NOT NULL,
                    id TEXT NOT NULL,
                    owner_id TEXT,
                    body TEXT NOT NULL,
                    stored_at TEXT NOT NULL DEFAULT (datetime('now')),
                    PRIMARY KEY (collection, id)
                );

                CREATE INDEX IF NOT EXISTS idx_records_owner ON records(collection, owner_id);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    pub fn insert_record(&self, collection: &str, record: &Value) -> Result<()> {
        let id = record
            .get("id")
            .and_then(Value::as_str)
            .context("Record has no string id")?;
        let owner_id = record.get("ownerId").and_then(Value::as_str);
        let body = serde_json::to_string(record).context("Failed to encode record")?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO records (collection, id, owner_id, body) VALUES (?1, ?2, ?3, ?4)",
                params![collection, id, owner_id, body],
            )
            .context("Failed to insert record")?;
        Ok(())
    }

    pub fn get_record(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM records WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query record")?;
        body.map(|b| serde_json::from_str(&b).context("Failed to decode record body"))
            .transpose()
    }

    /// All records of a collection, optionally narrowed to one owner.
    pub fn list_records(&self, collection: &str, owner_id: Option<&str>) -> Result<Vec<Value>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT body FROM records
                 WHERE collection = ?1 AND (?2 IS NULL OR owner_id = ?2)
                 ORDER BY stored_at, id",
            )
            .context("Failed to prepare list_records")?;
        let rows = stmt
            .query_map(params![collection, owner_id], |row| row.get::<_, String>(0))
            .context("Failed to query records")?;
        let mut records = Vec::new();
        for row in rows {
            let body = row.context("Failed to read record row")?;
            records.push(serde_json::from_str(&body).context("Failed to decode record body")?);
        }
        Ok(records)
    }

    /// Merge `patch` into the stored record. Returns `false` when no such
    /// record exists.
    pub fn update_record(&self, collection: &str, id: &str, patch: &Value) -> Result<bool> {
        let Some(mut record) = self.get_record(collection, id)? else {
            return Ok(false);
        };
        merge_patch(&mut record, patch);
        let body = serde_json::to_string(&record).context("Failed to encode record")?;
        self.conn
            .execute(
                "UPDATE records SET body = ?1 WHERE collection = ?2 AND id = ?3",
                params![body, collection, id],
            )
            .context("Failed to update record")?;
        Ok(true)
    }

    pub fn delete_record(&self, collection: &str, id: &str) -> Result<bool> {
        let count = self
            .conn
            .execute(
                "DELETE FROM records WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )
            .context("Failed to delete record")?;
        Ok(count > 0)
    }
}

/// `RecordStore` backed by a local SQLite file.
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: DbHandle,
}

impl SqliteRecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
        Ok(Self {
            db: DbHandle::new(RecordDb::new(path)?),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            db: DbHandle::new(RecordDb::new_in_memory()?),
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn list(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<Vec<Value>, RemoteError> {
        let owner = query
            .filter
            .get("ownerId")
            .and_then(Value::as_str)
            .map(str::to_string);
        let mut records = self
            .db
            .call(move |db| db.list_records(collection.as_str(), owner.as_deref()))
            .await
            .map_err(RemoteError::Database)?;
        query.apply(&mut records);
        Ok(records)
    }

    async fn create(&self, collection: Collection, record: &Value) -> Result<(), RemoteError> {
        let record = record.clone();
        self.db
            .call(move |db| db.insert_record(collection.as_str(), &record))
            .await
            .map_err(RemoteError::Database)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: &Value,
    ) -> Result<(), RemoteError> {
        let owned_id = id.to_string();
        let patch = patch.clone();
        let found = self
            .db
            .call(move |db| db.update_record(collection.as_str(), &owned_id, &patch))
            .await
            .map_err(RemoteError::Database)?;
        if found {
            Ok(())
        } else {
            Err(RemoteError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        let id = id.to_string();
        self.db
            .call(move |db| db.delete_record(collection.as_str(), &id))
            .await
            .map(|_| ())
            .map_err(RemoteError::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::remote::SortOrder;
    use serde_json::json;

    #[test]
    fn test_insert_and_get_record() {
        let db = RecordDb::new_in_memory().unwrap();
        db.insert_record("boards", &json!({"id": "b1", "ownerId": "u1", "title": "Roadmap"}))
            .unwrap();
        let record = db.get_record("boards", "b1").unwrap().unwrap();
        assert_eq!(record["title"], "Roadmap");
        assert!(db.get_record("boards", "b2").unwrap().is_none());
        assert!(db.get_record("columns", "b1").unwrap().is_none());
    }

    #[test]
    fn test_insert_record_requires_id() {
        let db = RecordDb::new_in_memory().unwrap();
        assert!(db.insert_record("boards", &json!({"title": "x"})).is_err());
    }

    #[test]
    fn test_list_records_filters_by_owner() {
        let db = RecordDb::new_in_memory().unwrap();
        db.insert_record("tasks", &json!({"id": "t1", "ownerId": "u1"})).unwrap();
        db.insert_record("tasks", &json!({"id": "t2", "ownerId": "u2"})).unwrap();
        db.insert_record("boards", &json!({"id": "b1", "ownerId": "u1"})).unwrap();

        assert_eq!(db.list_records("tasks", None).unwrap().len(), 2);
        let mine = db.list_records("tasks", Some("u1")).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0]["id"], "t1");
    }

    #[test]
    fn test_update_record_merges_patch() {
        let db = RecordDb::new_in_memory().unwrap();
        db.insert_record("tasks", &json!({"id": "t1", "title": "a", "completed": false}))
            .unwrap();
        assert!(db.update_record("tasks", "t1", &json!({"completed": true})).unwrap());
        let record = db.get_record("tasks", "t1").unwrap().unwrap();
        assert_eq!(record["title"], "a");
        assert_eq!(record["completed"], true);
        assert!(!db.update_record("tasks", "missing", &json!({})).unwrap());
    }

    #[test]
    fn test_delete_record() {
        let db = RecordDb::new_in_memory().unwrap();
        db.insert_record("subtasks", &json!({"id": "s1"})).unwrap();
        assert!(db.delete_record("subtasks", "s1").unwrap());
        assert!(!db.delete_record("subtasks", "s1").unwrap());
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");
        {
            let db = RecordDb::new(&path).unwrap();
            db.insert_record("boards", &json!({"id": "b1"})).unwrap();
        }
        let db = RecordDb::new(&path).unwrap();
        assert!(db.get_record("boards", "b1").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sqlite_store_list_applies_query() {
        let store = SqliteRecordStore::in_memory().unwrap();
        for (id, pos) in [("c2", 1), ("c1", 0), ("c3", 2)] {
            store
                .create(
                    Collection::Columns,
                    &json!({"id": id, "ownerId": "u1", "boardId": "b1", "position": pos}),
                )
                .await
                .unwrap();
        }
        store
            .create(
                Collection::Columns,
                &json!({"id": "other", "ownerId": "u1", "boardId": "b2", "position": 0}),
            )
            .await
            .unwrap();

        let query = ListQuery::owned_by("u1")
            .where_eq("boardId", "b1")
            .order_by("position", SortOrder::Asc);
        let records = store.list(Collection::Columns, &query).await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[tokio::test]
    async fn test_sqlite_store_update_missing_is_not_found() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let err = store
            .update(Collection::Tasks, "ghost", &json!({"title": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_sqlite_store_open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("records.db");
        let store = SqliteRecordStore::open(&path).unwrap();
        store
            .create(Collection::Boards, &json!({"id": "b1", "ownerId": "u1"}))
            .await
            .unwrap();
        assert!(path.exists());
    }
}
