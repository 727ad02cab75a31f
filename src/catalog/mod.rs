//! Remote catalog gateway.
//!
//! The resolver only needs two calls from the remote side: fetch one record
//! by identifier, and fetch the whole record set for a bulk refresh. The
//! client additionally downloads model artifact files through `download`.
//!
//! # Error contract
//!
//! - `fetch_one` returns `NotFound` when the catalog does not know the
//!   identifier. The resolver treats this as a legitimate miss.
//! - Transport and server failures are `RemoteUnavailable`, carrying the HTTP
//!   status when there was one. [`RetryingCatalog`] retries the transient ones.

mod biomodels;
mod retry;

pub use biomodels::{BioModelsCatalog, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use retry::{RetryConfig, RetryingCatalog};

use async_trait::async_trait;

use crate::{CacheError, Result};
use crate::types::ModelRecord;

/// Source of truth behind the cache tiers.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Gateway name for logging/debugging.
    fn name(&self) -> &str;

    /// Fetch a single record by canonical identifier.
    async fn fetch_one(&self, id: &str) -> Result<ModelRecord>;

    /// Fetch every record the catalog exposes.
    async fn fetch_all(&self) -> Result<Vec<ModelRecord>>;

    /// Download the model artifact file for a canonical identifier.
    ///
    /// Gateways that only serve metadata keep the default, which reports
    /// `InvalidConfiguration`.
    async fn download(&self, id: &str) -> Result<Vec<u8>> {
        Err(CacheError::InvalidConfiguration(format!(
            "catalog '{}' cannot download {id}",
            self.name()
        )))
    }
}
