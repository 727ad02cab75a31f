//! Builder for configuring cache clients

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::CacheClient;
use crate::catalog::{
    BioModelsCatalog, CatalogGateway, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, RetryConfig,
    RetryingCatalog,
};
use crate::resolver::{ResolverConfig, TierResolver};
use crate::tier::{
    CacheTier, JsonFileTier, KeyValueTier, ObjectStoreTier, RecordStore, TierSlot,
};
use crate::{CacheError, Result};

/// Main entry point for creating cache clients.
pub struct Biomodels;

impl Biomodels {
    /// Create a new builder for configuring the client.
    pub fn builder() -> BiomodelsBuilder {
        BiomodelsBuilder::new()
    }
}

enum CatalogSource {
    Gateway(Arc<dyn CatalogGateway>),
    Http { base_url: String, timeout: Duration },
}

/// Builder for configuring cache clients.
///
/// Tiers are probed in the order they are added: first added = highest
/// priority.
pub struct BiomodelsBuilder {
    tiers: Vec<Arc<dyn CacheTier>>,
    catalog: Option<CatalogSource>,
    retry: Option<RetryConfig>,
    resolver: ResolverConfig,
    files_dir: Option<PathBuf>,
}

impl Default for BiomodelsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BiomodelsBuilder {
    pub fn new() -> Self {
        Self {
            tiers: Vec::new(),
            catalog: None,
            retry: None,
            resolver: ResolverConfig::default(),
            files_dir: None,
        }
    }

    // ========================================================================
    // Tiers (appended = lowest priority so far)
    // ========================================================================

    /// Add any persistence tier.
    pub fn tier(mut self, tier: Arc<dyn CacheTier>) -> Self {
        self.tiers.push(tier);
        self
    }

    /// Add a process-local key-value tier.
    pub fn key_value(self) -> Self {
        self.tier(Arc::new(KeyValueTier::in_memory()))
    }

    /// Add an object store tier rooted at `dir`.
    pub fn object_store(self, dir: impl Into<PathBuf>) -> Self {
        self.tier(Arc::new(ObjectStoreTier::new(dir)))
    }

    /// Add a JSON file tier at `path`.
    pub fn json_file(self, path: impl Into<PathBuf>) -> Self {
        self.tier(Arc::new(JsonFileTier::new(path)))
    }

    // ========================================================================
    // Remote catalog
    // ========================================================================

    /// Use a custom catalog gateway.
    pub fn catalog(mut self, gateway: Arc<dyn CatalogGateway>) -> Self {
        self.catalog = Some(CatalogSource::Gateway(gateway));
        self
    }

    /// Use the public BioModels service.
    pub fn biomodels(self) -> Self {
        self.biomodels_at(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Use a BioModels-compatible service at `base_url`.
    pub fn biomodels_at(mut self, base_url: impl Into<String>, timeout: Duration) -> Self {
        self.catalog = Some(CatalogSource::Http {
            base_url: base_url.into(),
            timeout,
        });
        self
    }

    /// Retry transient catalog failures.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    // ========================================================================
    // Behaviour
    // ========================================================================

    /// Refill faster tiers when a slower tier answers.
    pub fn backfill_tiers(mut self, enabled: bool) -> Self {
        self.resolver.backfill_tiers = enabled;
        self
    }

    /// Write remotely fetched records into every tier.
    pub fn write_through_on_fetch(mut self, enabled: bool) -> Self {
        self.resolver.write_through_on_fetch = enabled;
        self
    }

    /// Directory holding downloaded model artifacts.
    pub fn files_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.files_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<CacheClient> {
        if self.tiers.is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "at least one persistence tier must be configured".to_string(),
            ));
        }

        let catalog = match self.catalog {
            None => None,
            Some(CatalogSource::Gateway(gateway)) => Some(gateway),
            Some(CatalogSource::Http { base_url, timeout }) => {
                let http: Arc<dyn CatalogGateway> =
                    Arc::new(BioModelsCatalog::with_options(base_url, timeout)?);
                Some(http)
            }
        };
        let catalog = match (catalog, self.retry) {
            (Some(inner), Some(config)) => {
                Some(Arc::new(RetryingCatalog::new(inner, config)) as Arc<dyn CatalogGateway>)
            }
            (catalog, _) => catalog,
        };

        let resolver = TierResolver::new(
            RecordStore::new(),
            self.tiers.into_iter().map(TierSlot::new).collect(),
            catalog,
            self.resolver,
        );
        Ok(CacheClient::new(resolver, self.files_dir))
    }
}
