//! Model metadata record, the unit of caching.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Metadata for a single BioModels entry.
///
/// Records are immutable by replacement: a write under an existing `id`
/// replaces every field of the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    /// Canonical identifier (e.g. `BIOMD0000000012`). Unique across tiers.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub synopsis: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub curators: Vec<String>,
    /// Publication authors.
    #[serde(
        default,
        rename = "publicationAuthors",
        alias = "authors",
        deserialize_with = "null_as_default"
    )]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub journal: String,
    /// ISO calendar date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Logical file name → retrieval locator (URL or path).
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: BTreeMap<String, String>,
    /// RFC 3339 timestamp of the last refresh from the remote catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

// Upstream payloads carry explicit nulls for absent text and lists.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ModelRecord {
    /// Create a record with only its identifier set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_synopsis(mut self, synopsis: impl Into<String>) -> Self {
        self.synopsis = synopsis.into();
        self
    }

    pub fn with_curator(mut self, curator: impl Into<String>) -> Self {
        self.curators.push(curator.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn with_journal(mut self, journal: impl Into<String>) -> Self {
        self.journal = journal.into();
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, locator: impl Into<String>) -> Self {
        self.files.insert(name.into(), locator.into());
        self
    }

    /// The record's `date` as a calendar date.
    ///
    /// Accepts `YYYY-MM-DD` and full RFC 3339 timestamps (the date part is
    /// kept). Returns `None` when the field is missing or unparsable.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }

    /// Curator and author names, curators first.
    pub fn people(&self) -> impl Iterator<Item = &str> {
        self.curators
            .iter()
            .chain(self.authors.iter())
            .map(String::as_str)
    }
}
