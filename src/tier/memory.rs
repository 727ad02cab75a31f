//! In-process record store.

use crate::types::ModelRecord;

/// Thread-safe in-process cache of resolved records, keyed on identifier.
///
/// Backed by moka without a capacity bound or TTL: entries live until they
/// are replaced, invalidated or the store is cleared. Writes are plain key
/// overwrites, so concurrent backfills of the same identifier are safe.
#[derive(Clone)]
pub struct RecordStore {
    entries: moka::sync::Cache<String, ModelRecord>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: moka::sync::Cache::builder().build(),
        }
    }

    /// Look up a record. Returns `None` on miss.
    pub fn get(&self, id: &str) -> Option<ModelRecord> {
        self.entries.get(id)
    }

    /// Insert (or overwrite) a record, keyed on `record.id`.
    pub fn insert(&self, record: ModelRecord) {
        self.entries.insert(record.id.clone(), record);
    }

    /// Drop a single entry.
    pub fn invalidate(&self, id: &str) {
        self.entries.invalidate(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entries currently in the store.
    ///
    /// moka applies writes lazily; pending tasks are flushed first so the
    /// count reflects every completed insert.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
