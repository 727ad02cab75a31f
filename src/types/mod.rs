//! Public types for the biomodels-cache API.

mod file;
mod query;
mod record;
mod result;

pub use file::{FileDescriptor, FileType};
pub use query::{CacheQuery, DEFAULT_PAGE_SIZE, DateRange, Pagination, SearchFilters};
pub use record::ModelRecord;
pub use result::{Match, MatchField, SearchResult};
