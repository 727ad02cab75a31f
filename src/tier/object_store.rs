//! Embedded object store tier: one JSON document per record.
//!
//! Layout: `<dir>/<id>.json`. Each document is replaced atomically on its
//! own, which gives per-key atomicity without rewriting the whole set. An
//! in-memory index loaded at initialization answers reads. The index is kept
//! in identifier order, so search ties rank the same before and after reopen.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::{CacheTier, RecordTable, write_atomic};
use crate::types::ModelRecord;
use crate::{CacheError, Result};

const TIER_NAME: &str = "object_store";

/// Directory-backed object store tier.
pub struct ObjectStoreTier {
    dir: PathBuf,
    // None until `initialize` has loaded the directory.
    index: RwLock<Option<RecordTable>>,
    write_lock: Mutex<()>,
}

impl ObjectStoreTier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            index: RwLock::new(None),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn object_path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(CacheError::InvalidQuery(format!(
                "'{id}' is not a valid object key"
            )));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    fn not_initialized() -> CacheError {
        CacheError::tier(TIER_NAME, "object store used before initialize()")
    }

    /// Read every `*.json` document into a table ordered by identifier.
    async fn load_dir(&self) -> Result<RecordTable> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            CacheError::tier(TIER_NAME, format!("failed to list {}: {e}", self.dir.display()))
        })?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::tier(TIER_NAME, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut table = RecordTable::new();
        for path in paths {
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| CacheError::tier(TIER_NAME, format!("{}: {e}", path.display())))?;
            match serde_json::from_str::<ModelRecord>(&content) {
                Ok(mut record) => {
                    record.id = id.to_string();
                    table.upsert_sorted(record);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping corrupt object");
                }
            }
        }
        Ok(table)
    }
}

#[async_trait]
impl CacheTier for ObjectStoreTier {
    fn name(&self) -> &str {
        TIER_NAME
    }

    async fn initialize(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            CacheError::tier(TIER_NAME, format!("failed to create {}: {e}", self.dir.display()))
        })?;
        let table = self.load_dir().await?;
        debug!(dir = %self.dir.display(), count = table.len(), "object store opened");
        *self.index.write().await = Some(table);
        Ok(())
    }

    async fn get_by_key(&self, id: &str) -> Result<Option<ModelRecord>> {
        let index = self.index.read().await;
        let table = index.as_ref().ok_or_else(Self::not_initialized)?;
        Ok(table.get(id).cloned())
    }

    async fn records(&self) -> Result<RecordTable> {
        let index = self.index.read().await;
        index.clone().ok_or_else(Self::not_initialized)
    }

    async fn write_batch(&self, batch: &RecordTable) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.index.read().await.is_none() {
            return Err(Self::not_initialized());
        }

        for record in batch {
            let path = self.object_path(&record.id)?;
            let json = serde_json::to_vec_pretty(record)?;
            write_atomic(TIER_NAME, &path, &json).await?;

            // Documents written so far stay durable even if a later one fails.
            // The index mirrors the directory listing, so new keys go in key order.
            if let Some(table) = self.index.write().await.as_mut() {
                table.upsert_sorted(record.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let path = self.object_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CacheError::tier(
                    TIER_NAME,
                    format!("failed to remove {}: {e}", path.display()),
                ));
            }
        }
        let mut index = self.index.write().await;
        let table = index.as_mut().ok_or_else(Self::not_initialized)?;
        Ok(table.remove(id).is_some())
    }
}
