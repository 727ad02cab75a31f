//! Insertion-ordered record map.
//!
//! Search ties keep the source set's natural order, so every tier stores its
//! records in a [`RecordTable`]: a `Vec` in insertion order plus a position
//! index. Replacing a record keeps its original position.
//!
//! Serialized as a single JSON object keyed by identifier, which is also the
//! persisted layout of the file-backed tier.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::ModelRecord;

/// Records keyed by identifier, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    records: Vec<ModelRecord>,
    index: HashMap<String, usize>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ModelRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Insert or fully replace the record stored under `record.id`.
    ///
    /// Returns the replaced record, if any.
    pub fn upsert(&mut self, record: ModelRecord) -> Option<ModelRecord> {
        match self.index.get(&record.id) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos], record)),
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    /// Insert or replace keeping the table sorted by identifier.
    ///
    /// Only meaningful on a table built entirely through this method, which
    /// is how stores whose natural order is key order keep it across writes.
    pub fn upsert_sorted(&mut self, record: ModelRecord) -> Option<ModelRecord> {
        if let Some(&pos) = self.index.get(&record.id) {
            return Some(std::mem::replace(&mut self.records[pos], record));
        }
        let pos = self.records.partition_point(|r| r.id < record.id);
        self.records.insert(pos, record);
        for (offset, r) in self.records[pos..].iter().enumerate() {
            self.index.insert(r.id.clone(), pos + offset);
        }
        None
    }

    /// Upsert every record of `batch`, in batch order.
    pub fn merge(&mut self, batch: &RecordTable) {
        for record in batch.iter() {
            self.upsert(record.clone());
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<ModelRecord> {
        let pos = self.index.remove(id)?;
        let removed = self.records.remove(pos);
        for record in &self.records[pos..] {
            if let Some(p) = self.index.get_mut(&record.id) {
                *p -= 1;
            }
        }
        Some(removed)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelRecord> {
        self.records.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    pub fn into_records(self) -> Vec<ModelRecord> {
        self.records
    }
}

/// Two tables are equal when they hold the same records in the same order.
impl PartialEq for RecordTable {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl Eq for RecordTable {}

impl FromIterator<ModelRecord> for RecordTable {
    fn from_iter<I: IntoIterator<Item = ModelRecord>>(iter: I) -> Self {
        let mut table = RecordTable::new();
        for record in iter {
            table.upsert(record);
        }
        table
    }
}

impl From<ModelRecord> for RecordTable {
    fn from(record: ModelRecord) -> Self {
        std::iter::once(record).collect()
    }
}

impl IntoIterator for RecordTable {
    type Item = ModelRecord;
    type IntoIter = std::vec::IntoIter<ModelRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a ModelRecord;
    type IntoIter = std::slice::Iter<'a, ModelRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Serialize for RecordTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.id, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RecordTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TableVisitor)
    }
}

struct TableVisitor;

impl<'de> Visitor<'de> for TableVisitor {
    type Value = RecordTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object keyed by model identifier")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = RecordTable::new();
        while let Some((key, mut record)) = access.next_entry::<String, ModelRecord>()? {
            // The key is authoritative.
            record.id = key;
            table.upsert(record);
        }
        Ok(table)
    }
}
