//! Key-value tier: the whole cache as one JSON blob under a single key.
//!
//! Mirrors browser-style string storage. Every read parses the blob and
//! every batch write merges into it and stores it back in one `set_item`
//! call, so a reader sees either the old or the new blob.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CacheTier, RecordTable};
use crate::types::ModelRecord;
use crate::{CacheError, Result};

/// Key the blob is stored under by default.
pub const DEFAULT_CACHE_KEY: &str = "biomodels_cache";

const TIER_NAME: &str = "key_value";

/// Synchronous string key-value storage backend.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: String) -> Result<()>;
}

/// Process-local [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .read()
            .map_err(|e| CacheError::tier(TIER_NAME, format!("failed to acquire read lock: {e}")))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: String) -> Result<()> {
        let mut items = self.items.write().map_err(|e| {
            CacheError::tier(TIER_NAME, format!("failed to acquire write lock: {e}"))
        })?;
        items.insert(key.to_string(), value);
        Ok(())
    }
}

/// Tier storing all records as one JSON object under a single key.
pub struct KeyValueTier<S = MemoryKeyValueStore> {
    store: S,
    key: String,
    // Serializes read-modify-write cycles on the blob.
    write_lock: Mutex<()>,
}

impl KeyValueTier<MemoryKeyValueStore> {
    /// Tier over a fresh in-process store.
    pub fn in_memory() -> Self {
        Self::new(MemoryKeyValueStore::new())
    }
}

impl<S: KeyValueStore> KeyValueTier<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_CACHE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn load(&self) -> Result<RecordTable> {
        match self.store.get_item(&self.key)? {
            None => Ok(RecordTable::new()),
            Some(blob) => serde_json::from_str(&blob).map_err(|e| {
                CacheError::tier(TIER_NAME, format!("corrupt blob under '{}': {e}", self.key))
            }),
        }
    }

    fn save(&self, table: &RecordTable) -> Result<()> {
        let blob = serde_json::to_string(table)?;
        self.store.set_item(&self.key, blob)
    }
}

#[async_trait]
impl<S: KeyValueStore> CacheTier for KeyValueTier<S> {
    fn name(&self) -> &str {
        TIER_NAME
    }

    async fn get_by_key(&self, id: &str) -> Result<Option<ModelRecord>> {
        Ok(self.load()?.get(id).cloned())
    }

    async fn records(&self) -> Result<RecordTable> {
        self.load()
    }

    async fn write_batch(&self, batch: &RecordTable) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut table = self.load()?;
        table.merge(batch);
        self.save(&table)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut table = self.load()?;
        let removed = table.remove(id).is_some();
        if removed {
            self.save(&table)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_store_misses() {
        let tier = KeyValueTier::in_memory();
        assert!(tier.get_by_key("BIOMD0000000001").await.unwrap().is_none());
        assert!(tier.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_merges_into_existing_blob() {
        let tier = KeyValueTier::in_memory();
        let first: RecordTable = [
            ModelRecord::new("a").with_title("A"),
            ModelRecord::new("b").with_title("B"),
        ]
        .into_iter()
        .collect();
        tier.write_batch(&first).await.unwrap();

        let second = RecordTable::from(ModelRecord::new("b").with_title("B2"));
        tier.write_batch(&second).await.unwrap();

        let all = tier.records().await.unwrap();
        assert_eq!(all.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(all.get("b").unwrap().title, "B2");
    }

    #[tokio::test]
    async fn corrupt_blob_is_a_tier_failure() {
        let store = MemoryKeyValueStore::new();
        store
            .set_item(DEFAULT_CACHE_KEY, "{not json".to_string())
            .unwrap();
        let tier = KeyValueTier::new(store);
        let err = tier.get_by_key("a").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TierUnavailable);
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let tier = KeyValueTier::in_memory();
        tier.write_batch(&RecordTable::from(ModelRecord::new("a")))
            .await
            .unwrap();
        assert!(tier.delete("a").await.unwrap());
        assert!(!tier.delete("a").await.unwrap());
    }
}
