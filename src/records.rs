//! Name record storage.
//!
//! [`RecordStore`] is the persistence seam: list everything newest-first,
//! or append one name. [`SqliteRecordStore`] is the backend used by the
//! server and CLI. [`NameRecords`] sits on top and owns the submission
//! rules: whitespace-only names never reach the store, and a successful
//! insert is followed by a fresh listing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::models::NameRecord;

/// Abstract storage for [`NameRecord`]s.
///
/// Implementations generate the `id` and `created_at` of new records and
/// return listings ordered by `created_at` descending.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self) -> Result<Vec<NameRecord>>;

    async fn insert(&self, name: &str) -> Result<NameRecord>;
}

/// SQLite implementation of [`RecordStore`] over the `users` table.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn ts_from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .with_context(|| format!("created_at out of range: {}", ms))
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn list(&self) -> Result<Vec<NameRecord>> {
        // rowid breaks ties between inserts in the same millisecond
        let rows = sqlx::query(
            "SELECT id, name, created_at FROM users ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<NameRecord> {
                Ok(NameRecord {
                    id: row.get("id"),
                    name: row.get("name"),
                    created_at: ts_from_millis(row.get("created_at"))?,
                })
            })
            .collect()
    }

    async fn insert(&self, name: &str) -> Result<NameRecord> {
        let id = Uuid::new_v4().to_string();
        let millis = Utc::now().timestamp_millis();

        sqlx::query("INSERT INTO users (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(millis)
            .execute(&self.pool)
            .await?;

        Ok(NameRecord {
            id,
            name: name.to_string(),
            created_at: ts_from_millis(millis)?,
        })
    }
}

/// Outcome of [`NameRecords::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The name was empty after trimming; the store was not touched.
    Skipped,
    /// The name was stored. Carries the refreshed listing, or just the new
    /// record when the listing could not be read back.
    Added(Vec<NameRecord>),
}

/// Submission rules over a [`RecordStore`].
#[derive(Clone)]
pub struct NameRecords {
    store: Arc<dyn RecordStore>,
}

impl NameRecords {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<NameRecord>> {
        self.store.list().await.inspect_err(|e| {
            error!("fetch users failed: {:#}", e);
        })
    }

    /// Store `name` as given and return the refreshed listing. Names that
    /// are empty once trimmed are ignored without any store round trip.
    ///
    /// Only a failed insert is an error. A failed refresh is logged and the
    /// new record is returned on its own.
    pub async fn submit(&self, name: &str) -> Result<Submission> {
        if name.trim().is_empty() {
            debug!("ignoring empty name submission");
            return Ok(Submission::Skipped);
        }

        let record = self.store.insert(name).await.inspect_err(|e| {
            error!("insert user failed: {:#}", e);
        })?;
        debug!(id = %record.id, "inserted user");

        match self.list().await {
            Ok(list) => Ok(Submission::Added(list)),
            Err(_) => {
                warn!(id = %record.id, "user stored but refresh failed");
                Ok(Submission::Added(vec![record]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingStore {
        records: Mutex<Vec<NameRecord>>,
        lists: AtomicUsize,
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl RecordStore for CountingStore {
        async fn list(&self) -> Result<Vec<NameRecord>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            let mut records = self.records.lock().unwrap().clone();
            records.reverse();
            Ok(records)
        }

        async fn insert(&self, name: &str) -> Result<NameRecord> {
            let n = self.inserts.fetch_add(1, Ordering::SeqCst);
            let record = NameRecord {
                id: format!("id-{}", n),
                name: name.to_string(),
                created_at: ts_from_millis(n as i64)?,
            };
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn list(&self) -> Result<Vec<NameRecord>> {
            anyhow::bail!("store unreachable")
        }

        async fn insert(&self, _name: &str) -> Result<NameRecord> {
            anyhow::bail!("store unreachable")
        }
    }

    #[tokio::test]
    async fn test_whitespace_name_touches_nothing() {
        let store = Arc::new(CountingStore::default());
        let records = NameRecords::new(store.clone());

        for name in ["", "   ", "\t\n"] {
            assert_eq!(records.submit(name).await.unwrap(), Submission::Skipped);
        }
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
        assert_eq!(store.lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_inserts_then_relists() {
        let store = Arc::new(CountingStore::default());
        let records = NameRecords::new(store.clone());

        records.submit("Ada").await.unwrap();
        let Submission::Added(list) = records.submit("  Grace ").await.unwrap() else {
            panic!("expected Added");
        };

        assert_eq!(store.inserts.load(Ordering::SeqCst), 2);
        assert_eq!(store.lists.load(Ordering::SeqCst), 2);
        assert_eq!(list.len(), 2);
        // stored verbatim, newest first
        assert_eq!(list[0].name, "  Grace ");
        assert_eq!(list[1].name, "Ada");
    }

    /// Accepts inserts but cannot read anything back.
    #[derive(Default)]
    struct WriteOnlyStore {
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl RecordStore for WriteOnlyStore {
        async fn list(&self) -> Result<Vec<NameRecord>> {
            anyhow::bail!("read replica down")
        }

        async fn insert(&self, name: &str) -> Result<NameRecord> {
            let n = self.inserts.fetch_add(1, Ordering::SeqCst);
            Ok(NameRecord {
                id: format!("id-{}", n),
                name: name.to_string(),
                created_at: ts_from_millis(n as i64)?,
            })
        }
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_successful_insert() {
        let store = Arc::new(WriteOnlyStore::default());
        let records = NameRecords::new(store.clone());

        let submission = records.submit("Ada").await.unwrap();
        let Submission::Added(list) = submission else {
            panic!("expected Added");
        };
        assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Ada");
        assert!(records.list().await.is_err());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let records = NameRecords::new(Arc::new(BrokenStore));
        assert!(records.list().await.is_err());
        assert!(records.submit("Ada").await.is_err());
        assert_eq!(records.submit(" ").await.unwrap(), Submission::Skipped);
    }

    async fn sqlite_store() -> (tempfile::TempDir, SqliteRecordStore) {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = crate::config::Config::minimal();
        config.db.path = tmp.path().join("records.sqlite");
        let pool = crate::db::connect(&config).await.unwrap();
        crate::migrate::apply_schema(&pool).await.unwrap();
        (tmp, SqliteRecordStore::new(pool))
    }

    #[tokio::test]
    async fn test_sqlite_lists_newest_first() {
        let (_tmp, store) = sqlite_store().await;
        assert!(store.list().await.unwrap().is_empty());

        let first = store.insert("first").await.unwrap();
        let second = store.insert("second").await.unwrap();
        let third = store.insert("third").await.unwrap();
        assert_ne!(first.id, second.id);

        let list = store.list().await.unwrap();
        let names: Vec<&str> = list.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
        assert_eq!(list[0], third);
    }

    #[tokio::test]
    async fn test_sqlite_keeps_duplicate_names() {
        let (_tmp, store) = sqlite_store().await;
        store.insert("same").await.unwrap();
        store.insert("same").await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);
    }
}
