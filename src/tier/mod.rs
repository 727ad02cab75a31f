//! Storage tiers.
//!
//! A tier is one storage backend in the fallback chain. Persistence tiers
//! implement the [`CacheTier`] capability trait and the resolver holds them
//! as an ordered `Vec<Arc<dyn CacheTier>>` (index 0 = highest priority),
//! never special-casing a concrete type.
//!
//! - [`RecordStore`]: in-process, fastest tier. Not a [`CacheTier`]: it is
//!   a cache of the persistence tiers and may be dropped at any time.
//! - [`KeyValueTier`]: one serialized JSON blob under a single key of a
//!   string key-value store (browser-storage style).
//! - [`ObjectStoreTier`]: embedded object store, one JSON document per
//!   record in a directory.
//! - [`JsonFileTier`]: flat JSON file holding every record, rewritten on
//!   each batch write.
//!
//! # Contract
//!
//! - `initialize` is idempotent; the resolver calls it at most once per tier
//!   lifecycle (see `TierSlot`).
//! - A missing key is `Ok(None)`, never an error. Errors mean genuine I/O or
//!   decoding failures.
//! - `write_batch` applies per-key full replacement and must never expose a
//!   half-written record to concurrent readers.

mod json_file;
mod key_value;
mod memory;
mod object_store;
mod table;

pub use json_file::{DEFAULT_CACHE_FILE, JsonFileTier};
pub use key_value::{DEFAULT_CACHE_KEY, KeyValueStore, KeyValueTier, MemoryKeyValueStore};
pub use memory::RecordStore;
pub use object_store::ObjectStoreTier;
pub use table::RecordTable;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::search;
use crate::{CacheError, Result};
use crate::types::{CacheQuery, ModelRecord, SearchResult};

/// Uniform capability interface of a persistence tier.
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Tier name for logging and metrics.
    fn name(&self) -> &str;

    /// Prepare the backend (create directories, load indexes, ...).
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Look up one record. `Ok(None)` on a miss.
    async fn get_by_key(&self, id: &str) -> Result<Option<ModelRecord>>;

    /// The tier's full record set in natural (insertion) order.
    async fn records(&self) -> Result<RecordTable>;

    /// Rank the tier's records against `query`, unpaginated.
    ///
    /// Default implementation runs the search engine over [`records()`](Self::records).
    async fn search(&self, query: &CacheQuery) -> Result<Vec<SearchResult>> {
        let records = self.records().await?;
        Ok(search::rank(&records, query))
    }

    /// Insert or fully replace every record of `batch`.
    async fn write_batch(&self, batch: &RecordTable) -> Result<()>;

    /// Remove a record. Returns whether it was present.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// A tier plus its one-shot initialization guard.
pub(crate) struct TierSlot {
    tier: Arc<dyn CacheTier>,
    init: OnceCell<()>,
}

impl TierSlot {
    pub(crate) fn new(tier: Arc<dyn CacheTier>) -> Self {
        Self {
            tier,
            init: OnceCell::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.tier.name()
    }

    /// The tier, initialized on first access.
    ///
    /// A failed initialization is not cached; the next access retries it.
    pub(crate) async fn ready(&self) -> Result<&dyn CacheTier> {
        self.init
            .get_or_try_init(|| async {
                debug!(tier = self.tier.name(), "initializing tier");
                self.tier.initialize().await
            })
            .await?;
        Ok(self.tier.as_ref())
    }
}

/// Replace `path` with `contents` via a temporary sibling and a rename, so
/// readers observe either the old or the new file, never a truncated one.
pub(crate) async fn write_atomic(tier: &str, path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            CacheError::tier(tier, format!("failed to create dir {}: {e}", parent.display()))
        })?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(|e| {
        CacheError::tier(tier, format!("failed to write {}: {e}", tmp_path.display()))
    })?;
    tokio::fs::rename(&tmp_path, path).await.map_err(|e| {
        CacheError::tier(
            tier,
            format!(
                "failed to rename {} → {}: {e}",
                tmp_path.display(),
                path.display()
            ),
        )
    })
}
