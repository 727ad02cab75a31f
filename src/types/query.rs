//! Search request types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{CacheError, Result};

/// Default page size for page-addressed pagination.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A search request against cached records.
///
/// On the wire pagination is flat: `offset`/`limit` or `page`/`pageSize`
/// sit next to `term`, and a missing `pageSize` means [`DEFAULT_PAGE_SIZE`].
/// A nested `pagination` object is accepted as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QueryWire", into = "QueryWire")]
pub struct CacheQuery {
    /// Free text, matched case-insensitively as a substring.
    pub term: String,
    pub filters: SearchFilters,
    pub pagination: Pagination,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryWire {
    #[serde(default, alias = "query")]
    term: String,
    #[serde(default, skip_serializing_if = "SearchFilters::is_empty")]
    filters: SearchFilters,
    #[serde(default, skip_serializing)]
    pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_size: Option<usize>,
}

impl From<QueryWire> for CacheQuery {
    fn from(wire: QueryWire) -> Self {
        let pagination = match wire.pagination {
            Some(pagination) => pagination,
            None if wire.page.is_none() && wire.page_size.is_none() => Pagination::Offset {
                offset: wire.offset.unwrap_or(0),
                limit: wire.limit,
            },
            None => Pagination::Page {
                page: wire.page.unwrap_or(1),
                page_size: wire.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            },
        };
        Self {
            term: wire.term,
            filters: wire.filters,
            pagination,
        }
    }
}

impl From<CacheQuery> for QueryWire {
    fn from(query: CacheQuery) -> Self {
        let mut wire = QueryWire {
            term: query.term,
            filters: query.filters,
            pagination: None,
            offset: None,
            limit: None,
            page: None,
            page_size: None,
        };
        match query.pagination {
            Pagination::Offset { offset, limit } => {
                wire.offset = (offset > 0).then_some(offset);
                wire.limit = limit;
            }
            Pagination::Page { page, page_size } => {
                wire.page = Some(page);
                wire.page_size = Some(page_size);
            }
        }
        wire
    }
}

impl CacheQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    /// Require at least one matching curator or author (any-match).
    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.filters.authors.push(name.into());
        self
    }

    /// Accept records from this journal (any-match, exact).
    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.filters.journals.push(journal.into());
        self
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.filters.date_range = Some(range);
        self
    }

    pub fn filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Address results by 1-based page.
    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.pagination = Pagination::Page { page, page_size };
        self
    }

    /// Address results by 0-based offset, keeping any limit already set.
    pub fn offset(mut self, offset: usize) -> Self {
        let limit = match self.pagination {
            Pagination::Offset { limit, .. } => limit,
            Pagination::Page { .. } => None,
        };
        self.pagination = Pagination::Offset { offset, limit };
        self
    }

    /// Cap the number of results, keeping any offset already set.
    pub fn limit(mut self, limit: usize) -> Self {
        let offset = match self.pagination {
            Pagination::Offset { offset, .. } => offset,
            Pagination::Page { .. } => 0,
        };
        self.pagination = Pagination::Offset {
            offset,
            limit: Some(limit),
        };
        self
    }
}

/// Structured filters applied after the text predicate.
///
/// Empty lists are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub journals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl SearchFilters {
    /// Whether no filter is active.
    pub fn is_empty(&self) -> bool {
        self.authors.is_empty() && self.journals.is_empty() && self.date_range.is_none()
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse a range from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|e| CacheError::InvalidQuery(format!("invalid date '{s}': {e}")))
        };
        Ok(Self::new(parse(start)?, parse(end)?))
    }

    /// Whether `date` falls inside the range, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// How a ranked result sequence is sliced.
///
/// Both modes are plain slices; out-of-range addresses yield an empty
/// sequence rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum Pagination {
    /// 0-based offset; `limit: None` means "to the end".
    Offset { offset: usize, limit: Option<usize> },
    /// 1-based page number.
    #[serde(rename_all = "camelCase")]
    Page { page: usize, page_size: usize },
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::Offset {
            offset: 0,
            limit: None,
        }
    }
}

impl Pagination {
    /// Page-addressed pagination with the default page size.
    pub fn page(page: usize) -> Self {
        Pagination::Page {
            page,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// The `[start, end)` window this pagination selects from `len` items.
    fn window(&self, len: usize) -> (usize, usize) {
        let (start, count) = match *self {
            Pagination::Offset { offset, limit } => (offset, limit.unwrap_or(len)),
            // Page 0 does not exist; map it past the end.
            Pagination::Page { page: 0, .. } => (len, 0),
            Pagination::Page { page, page_size } => {
                ((page - 1).saturating_mul(page_size), page_size)
            }
        };
        let start = start.min(len);
        (start, start.saturating_add(count).min(len))
    }

    /// Slice `items` according to this pagination.
    pub fn apply<T>(&self, mut items: Vec<T>) -> Vec<T> {
        let (start, end) = self.window(items.len());
        items.truncate(end);
        items.drain(..start);
        items
    }
}
