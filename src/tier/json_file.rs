//! Flat JSON file tier.
//!
//! The file holds one JSON object keyed by model identifier. Reads parse the
//! whole file; writes load, merge and atomically replace it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{CacheTier, RecordTable, write_atomic};
use crate::types::ModelRecord;
use crate::{CacheError, Result};

/// File name used when a tier is created from a directory.
pub const DEFAULT_CACHE_FILE: &str = "biomodels_cache.json";

const TIER_NAME: &str = "json_file";

/// Tier persisting every record into a single JSON file.
pub struct JsonFileTier {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileTier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Tier over `<dir>/biomodels_cache.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_CACHE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current contents to `dest` (pretty-printed).
    ///
    /// Returns the number of records exported.
    pub async fn export_to(&self, dest: impl AsRef<Path>) -> Result<usize> {
        let table = self.load().await?;
        let json = serde_json::to_vec_pretty(&table)?;
        write_atomic(TIER_NAME, dest.as_ref(), &json).await?;
        info!(dest = %dest.as_ref().display(), count = table.len(), "exported cache file");
        Ok(table.len())
    }

    /// Replace this tier's contents with a previously exported file.
    ///
    /// Returns the number of records imported.
    pub async fn import_from(&self, src: impl AsRef<Path>) -> Result<usize> {
        let src = src.as_ref();
        let content = tokio::fs::read_to_string(src).await?;
        let incoming: RecordTable = serde_json::from_str(&content)?;
        let _guard = self.write_lock.lock().await;
        self.save(&incoming).await?;
        info!(src = %src.display(), count = incoming.len(), "imported cache file");
        Ok(incoming.len())
    }

    async fn load(&self) -> Result<RecordTable> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RecordTable::new()),
            Err(e) => {
                return Err(CacheError::tier(
                    TIER_NAME,
                    format!("failed to read {}: {e}", self.path.display()),
                ));
            }
        };
        if content.trim().is_empty() {
            return Ok(RecordTable::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            CacheError::tier(
                TIER_NAME,
                format!("failed to parse {}: {e}", self.path.display()),
            )
        })
    }

    async fn save(&self, table: &RecordTable) -> Result<()> {
        let json = serde_json::to_vec_pretty(table)?;
        write_atomic(TIER_NAME, &self.path, &json).await
    }
}

#[async_trait]
impl CacheTier for JsonFileTier {
    fn name(&self) -> &str {
        TIER_NAME
    }

    async fn initialize(&self) -> Result<()> {
        let exists = tokio::fs::try_exists(&self.path).await.map_err(|e| {
            CacheError::tier(
                TIER_NAME,
                format!("failed to stat {}: {e}", self.path.display()),
            )
        })?;
        if exists {
            return Ok(());
        }
        debug!(path = %self.path.display(), "creating empty cache file");
        write_atomic(TIER_NAME, &self.path, b"{}").await
    }

    async fn get_by_key(&self, id: &str) -> Result<Option<ModelRecord>> {
        Ok(self.load().await?.get(id).cloned())
    }

    async fn records(&self) -> Result<RecordTable> {
        self.load().await
    }

    async fn write_batch(&self, batch: &RecordTable) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut table = self.load().await?;
        table.merge(batch);
        self.save(&table).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut table = self.load().await?;
        let removed = table.remove(id).is_some();
        if removed {
            self.save(&table).await?;
        }
        Ok(removed)
    }
}
