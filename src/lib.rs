//! biomodels-cache - Read-through multi-tier cache for BioModels metadata
//!
//! A lookup goes through an ordered chain: the in-process record store,
//! then each persistence tier in priority order, then the remote BioModels
//! catalog. Hits in slower tiers refill the record store; remote fetches are
//! written to every tier concurrently. Searches run a fixed scoring heuristic
//! against the first tier that has any match.
//!
//! # Lookup Example
//!
//! ```rust,no_run
//! use biomodels_cache::Biomodels;
//!
//! #[tokio::main]
//! async fn main() -> biomodels_cache::Result<()> {
//!     let client = Biomodels::builder()
//!         .key_value()
//!         .json_file("/tmp/biomodels/biomodels_cache.json")
//!         .biomodels()
//!         .build()?;
//!
//!     if let Some(found) = client.get_model("12").await? {
//!         println!("{} ({})", found.record.title, found.source.label());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Search Example
//!
//! ```rust,no_run
//! use biomodels_cache::{Biomodels, CacheQuery, DateRange};
//!
//! # async fn run() -> biomodels_cache::Result<()> {
//! let client = Biomodels::builder()
//!     .json_file("/tmp/biomodels/biomodels_cache.json")
//!     .build()?;
//!
//! let query = CacheQuery::new("glycolysis")
//!     .journal("Nature")
//!     .date_range(DateRange::parse("2019-01-01", "2020-12-31")?)
//!     .page(1, 10);
//! for hit in client.search(&query).await? {
//!     println!("{} {}", hit.score, hit.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod files;
pub mod id;
pub mod merge;
pub mod resolver;
pub mod search;
pub mod telemetry;
pub mod tier;
pub mod types;

// Re-export main types at crate root
pub use catalog::{BioModelsCatalog, CatalogGateway, RetryConfig, RetryingCatalog};
pub use client::{Biomodels, BiomodelsBuilder, CacheClient, DeleteReport, UpdateReport};
pub use config::Config;
pub use error::{CacheError, ErrorKind, Result};
pub use merge::{PartialWriteFailure, TierWriteFailure};
pub use resolver::{Resolution, ResolutionSource, ResolverConfig};
pub use tier::{
    CacheTier, JsonFileTier, KeyValueStore, KeyValueTier, MemoryKeyValueStore, ObjectStoreTier,
    RecordStore, RecordTable,
};

// Re-export all types
pub use types::{
    CacheQuery, DateRange, FileDescriptor, FileType, Match, MatchField, ModelRecord, Pagination,
    SearchFilters, SearchResult,
};

/// Crate version.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
