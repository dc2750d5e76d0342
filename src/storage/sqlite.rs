//! SQLite product store.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{debug, error, info, warn};

use super::ProductStore;
use crate::error::StoreError;
use crate::models::ProductRecord;

/// How long a write waits on another writer's lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Records stored as JSON rows in a single `products` table, keyed by collection.
///
/// Every statement runs on the blocking pool, so a writer stuck behind a
/// locked database never stalls the scraper's runtime.
pub struct SqliteStore {
    path: PathBuf,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        // Parallel query runs share one file
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                product_url TEXT NOT NULL,
                record TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_products_collection ON products(collection);
            "#,
        )?;
        debug!("Opened product store at {:?}", path);

        Ok(Self {
            path: path.to_path_buf(),
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Run `op` against the open connection on the blocking pool.
    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            let conn = guard.as_mut().ok_or(StoreError::Closed)?;
            op(conn)
        })
        .await?
    }
}

fn insert_all(
    conn: &mut Connection,
    records: &[ProductRecord],
    collection: &str,
) -> Result<usize, StoreError> {
    let saved_at = Utc::now().to_rfc3339();

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO products (collection, product_url, record, saved_at)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for record in records {
            let json = serde_json::to_string(record)?;
            stmt.execute(params![collection, record.product_url, json, saved_at])?;
        }
    }
    tx.commit()?;
    Ok(records.len())
}

fn select_collection(conn: &Connection, collection: &str) -> Result<Vec<ProductRecord>, StoreError> {
    let mut stmt = conn.prepare("SELECT record FROM products WHERE collection = ?1 ORDER BY id")?;
    let rows = stmt.query_map([collection], |row| row.get::<_, String>(0))?;

    let mut records = Vec::new();
    for row in rows {
        let json = row?;
        match serde_json::from_str(&json) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping unreadable record in '{}': {}", collection, e),
        }
    }
    Ok(records)
}

#[async_trait]
impl ProductStore for SqliteStore {
    async fn save(&self, records: &[ProductRecord], collection: &str) -> usize {
        if records.is_empty() {
            return 0;
        }
        let batch = records.to_vec();
        let name = collection.to_string();
        match self.with_conn(move |conn| insert_all(conn, &batch, &name)).await {
            Ok(count) => {
                info!("Saved {} products to collection '{}'", count, collection);
                count
            }
            Err(e) => {
                error!("Failed to save {} products to '{}': {}", records.len(), collection, e);
                0
            }
        }
    }

    async fn load(&self, collection: &str) -> Result<Vec<ProductRecord>, StoreError> {
        let name = collection.to_string();
        self.with_conn(move |conn| select_collection(conn, &name)).await
    }

    async fn collections(&self) -> Result<Vec<String>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT collection FROM products ORDER BY collection")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(names)
        })
        .await
    }

    async fn close(&self) {
        let conn = Arc::clone(&self.conn);
        let closed = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?.take();
            match conn.map(Connection::close) {
                Some(Err((_, e))) => Err(StoreError::Database(e)),
                _ => Ok(()),
            }
        })
        .await;

        match closed {
            Ok(Ok(())) => debug!("Closed product store {:?}", self.path),
            Ok(Err(e)) => warn!("Error closing product store {:?}: {}", self.path, e),
            Err(e) => warn!("Could not close product store {:?}: {}", self.path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawProductFields;

    fn record(name: &str, url: &str) -> ProductRecord {
        ProductRecord::from_raw(
            "Tokopedia",
            RawProductFields {
                product_name: name.to_string(),
                price: "Rp15.000".to_string(),
                product_url: url.to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn save_then_load_by_collection() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&tmp.path().join("nested/products.db")).unwrap();

        let batch = vec![record("Gula Aren 1kg", "https://t/1"), record("Gula Semut", "https://t/2")];
        assert_eq!(store.save(&batch, "products_tokopedia_gula_aren").await, 2);
        assert_eq!(store.save(&[record("VCO", "https://t/3")], "products_tokopedia_vco").await, 1);

        let loaded = store.load("products_tokopedia_gula_aren").await.unwrap();
        assert_eq!(loaded, batch);
        assert_eq!(
            store.collections().await.unwrap(),
            vec!["products_tokopedia_gula_aren", "products_tokopedia_vco"]
        );
        assert!(store.load("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_store_saves_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&tmp.path().join("products.db")).unwrap();
        store.close().await;

        assert_eq!(store.save(&[record("x", "u")], "c").await, 0);
        assert!(matches!(store.load("c").await, Err(StoreError::Closed)));
    }

    #[tokio::test]
    async fn locked_database_does_not_stall_runtime() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("products.db");
        let store = SqliteStore::open(&db).unwrap();

        let writer = Connection::open(&db).unwrap();
        writer.execute_batch("BEGIN IMMEDIATE").unwrap();
        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            writer.execute_batch("COMMIT").unwrap();
        });

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let saved = store.save(&[record("Gula Aren", "https://t/1")], "c").await;
        let ticks_during = ticks.load(Ordering::SeqCst);
        ticker.abort();
        release.await.unwrap();

        assert_eq!(saved, 1);
        assert!(ticks_during >= 5, "runtime stalled: {} ticks", ticks_during);
        assert_eq!(store.load("c").await.unwrap().len(), 1);
    }
}
