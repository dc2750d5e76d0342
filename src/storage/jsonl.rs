//! JSON-lines product store: one `<collection>.jsonl` file per collection.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::ProductStore;
use crate::error::StoreError;
use crate::models::ProductRecord;

const EXTENSION: &str = "jsonl";

pub struct JsonlStore {
    dir: PathBuf,
    /// Serializes appends so concurrent runs never interleave lines.
    write_lock: Mutex<()>,
    closed: AtomicBool,
}

impl JsonlStore {
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    fn file_for(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", collection, EXTENSION))
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    async fn append(&self, records: &[ProductRecord], collection: &str) -> Result<usize, StoreError> {
        self.ensure_open()?;

        let mut buf = String::new();
        for record in records {
            buf.push_str(&serde_json::to_string(record)?);
            buf.push('\n');
        }

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(collection))
            .await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;
        Ok(records.len())
    }
}

#[async_trait]
impl ProductStore for JsonlStore {
    async fn save(&self, records: &[ProductRecord], collection: &str) -> usize {
        if records.is_empty() {
            return 0;
        }
        match self.append(records, collection).await {
            Ok(count) => {
                info!("Saved {} products to {:?}", count, self.file_for(collection));
                count
            }
            Err(e) => {
                error!("Failed to save {} products to '{}': {}", records.len(), collection, e);
                0
            }
        }
    }

    async fn load(&self, collection: &str) -> Result<Vec<ProductRecord>, StoreError> {
        self.ensure_open()?;
        let path = self.file_for(collection);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("{:?} line {}: {}", path, line_no + 1, e),
            }
        }
        Ok(records)
    }

    async fn collections(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_open()?;
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawProductFields;

    fn record(name: &str) -> ProductRecord {
        ProductRecord::from_raw(
            "Tokopedia",
            RawProductFields {
                product_name: name.to_string(),
                sold_count: "2rb terjual".to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn appends_across_saves() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(tmp.path()).unwrap();

        assert_eq!(store.save(&[record("a")], "products_tokopedia_vco").await, 1);
        assert_eq!(store.save(&[record("b"), record("c")], "products_tokopedia_vco").await, 2);

        let names: Vec<_> = store
            .load("products_tokopedia_vco")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.product_name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(store.collections().await.unwrap(), vec!["products_tokopedia_vco"]);
    }

    #[tokio::test]
    async fn bad_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(tmp.path()).unwrap();
        store.save(&[record("ok")], "c").await;
        std::fs::write(
            tmp.path().join("c.jsonl"),
            format!(
                "{}\nnot json\n",
                serde_json::to_string(&record("ok")).unwrap()
            ),
        )
        .unwrap();

        assert_eq!(store.load("c").await.unwrap().len(), 1);
        assert!(store.load("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_store_refuses_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(tmp.path()).unwrap();
        store.close().await;
        assert_eq!(store.save(&[record("a")], "c").await, 0);
    }
}
