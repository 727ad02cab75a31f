//! CacheClient - the read-through cache facade

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::catalog::{BioModelsCatalog, CatalogGateway};
use crate::config::{Config, TierKind};
use crate::merge::{self, PartialWriteFailure};
use crate::resolver::{Resolution, TierResolver};
use crate::tier::{
    CacheTier, JsonFileTier, KeyValueTier, ObjectStoreTier, RecordStore, RecordTable,
};
use crate::types::{CacheQuery, FileDescriptor, FileType, SearchResult};
use crate::{CacheError, Result, files, id};

use super::Biomodels;

/// Outcome of a bulk refresh from the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// Records received from the catalog.
    pub fetched: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_failure: Option<PartialWriteFailure>,
}

/// Outcome of an explicit deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    /// Whether any tier held the record.
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_failure: Option<PartialWriteFailure>,
}

/// Read-through cache client over the configured tiers and catalog.
pub struct CacheClient {
    resolver: TierResolver,
    files_dir: Option<PathBuf>,
}

impl CacheClient {
    pub(crate) fn new(resolver: TierResolver, files_dir: Option<PathBuf>) -> Self {
        Self {
            resolver,
            files_dir,
        }
    }

    /// Build a client from a loaded [`Config`].
    ///
    /// File-backed tiers live under the configured cache directory, which is
    /// also where artifact files are downloaded and looked up.
    ///
    /// `key_value` builds a process-local store: its contents are gone when
    /// the process exits.
    pub fn from_config(config: &Config) -> Result<Self> {
        let dir = config.cache_dir()?;
        let mut builder = Biomodels::builder()
            .backfill_tiers(config.cache.backfill_tiers)
            .write_through_on_fetch(config.cache.write_through_on_fetch)
            .files_dir(&dir);

        if !config.cache.tiers.is_empty() && !config.cache.is_persistent() {
            warn!("only key_value tiers configured; nothing will outlive this process");
        }

        for kind in &config.cache.tiers {
            let tier: Arc<dyn CacheTier> = match kind {
                TierKind::KeyValue => Arc::new(KeyValueTier::in_memory()),
                TierKind::ObjectStore => Arc::new(ObjectStoreTier::new(dir.join("objects"))),
                TierKind::JsonFile => Arc::new(JsonFileTier::new(config.cache_file()?)),
            };
            builder = builder.tier(tier);
        }

        if config.catalog.enabled {
            let http: Arc<dyn CatalogGateway> = Arc::new(BioModelsCatalog::with_options(
                &config.catalog.base_url,
                config.catalog.timeout(),
            )?);
            builder = builder.catalog(http).retry(config.retry.clone());
        }

        builder.build()
    }

    /// Initialize every tier now instead of on first use.
    ///
    /// All tiers are attempted; the first failure is returned.
    pub async fn initialize(&self) -> Result<()> {
        let mut first_err = None;
        for (_, outcome) in self.resolver.initialize().await {
            if let Err(e) = outcome {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Normalize a user-supplied identifier, then resolve it.
    pub async fn get_model(&self, raw_id: &str) -> Result<Option<Resolution>> {
        let id = id::normalize(raw_id)?;
        self.resolve(&id).await
    }

    /// Resolve a canonical identifier through the tier chain.
    pub async fn resolve(&self, id: &str) -> Result<Option<Resolution>> {
        self.resolver.resolve(id).await
    }

    /// Search the first tier with matches.
    pub async fn search(&self, query: &CacheQuery) -> Result<Vec<SearchResult>> {
        self.resolver.search(query).await
    }

    /// Describe the downloaded artifact file of a model.
    pub async fn file_descriptor(&self, raw_id: &str) -> Result<FileDescriptor> {
        files::describe(self.files_dir()?, &id::normalize(raw_id)?).await
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Refresh every tier from the catalog's full record set.
    #[instrument(skip(self), fields(operation = "update_cache"))]
    pub async fn update_cache(&self) -> Result<UpdateReport> {
        let catalog = self.resolver.catalog().ok_or_else(|| {
            CacheError::InvalidConfiguration("no remote catalog configured".to_string())
        })?;

        let records = match catalog.fetch_all().await {
            Ok(records) => {
                TierResolver::record_fetch("fetch_all", "ok");
                records
            }
            Err(e) => {
                TierResolver::record_fetch("fetch_all", "error");
                return Err(e);
            }
        };

        let stamp = Utc::now().to_rfc3339();
        let batch: RecordTable = records
            .into_iter()
            .map(|mut record| {
                record.last_updated = Some(stamp.clone());
                record
            })
            .collect();

        let write_failure = merge::fan_out(self.resolver.tiers(), &batch).await;
        self.invalidate(&batch);
        info!(fetched = batch.len(), "cache refreshed");

        Ok(UpdateReport {
            fetched: batch.len(),
            write_failure,
        })
    }

    /// Download a model's artifact file from the catalog into the files
    /// directory, replacing any previous copy of the same type.
    #[instrument(skip(self), fields(operation = "download"))]
    pub async fn download_model(&self, raw_id: &str, file_type: FileType) -> Result<FileDescriptor> {
        let dir = self.files_dir()?;
        let catalog = self.resolver.catalog().ok_or_else(|| {
            CacheError::InvalidConfiguration("no remote catalog configured".to_string())
        })?;
        let id = id::normalize(raw_id)?;

        let bytes = match catalog.download(&id).await {
            Ok(bytes) => {
                TierResolver::record_fetch("download", "ok");
                bytes
            }
            Err(e) => {
                let status = match e {
                    CacheError::NotFound(_) => "not_found",
                    _ => "error",
                };
                TierResolver::record_fetch("download", status);
                return Err(e);
            }
        };

        let descriptor = files::store(dir, &id, file_type, &bytes).await?;
        info!(
            id = %id,
            path = %descriptor.path.display(),
            size = descriptor.size,
            "model file downloaded"
        );
        Ok(descriptor)
    }

    /// Merge `batch` into every tier.
    ///
    /// Returns the failed tiers, if any; the records stay durable in the
    /// tiers that accepted them.
    pub async fn merge(&self, batch: &RecordTable) -> Option<PartialWriteFailure> {
        let failure = merge::fan_out(self.resolver.tiers(), batch).await;
        self.invalidate(batch);
        failure
    }

    /// Merge `batch` into the tier named `tier` only.
    pub async fn merge_into(&self, tier: &str, batch: &RecordTable) -> Result<()> {
        let slot = self
            .resolver
            .tiers()
            .iter()
            .find(|slot| slot.name() == tier)
            .ok_or_else(|| CacheError::InvalidQuery(format!("no tier named '{tier}'")))?;
        merge::merge(slot.ready().await?, batch).await?;
        self.invalidate(batch);
        Ok(())
    }

    /// Remove a record from memory and from every tier.
    pub async fn delete(&self, id: &str) -> Result<DeleteReport> {
        self.resolver.store().invalidate(id);
        let (removed, write_failure) = merge::fan_out_delete(self.resolver.tiers(), id).await;
        match write_failure {
            Some(failure) if failure.succeeded.is_empty() => {
                warn!(id, "delete failed in every tier");
                Err(CacheError::PartialWrite(failure))
            }
            write_failure => Ok(DeleteReport {
                removed,
                write_failure,
            }),
        }
    }

    /// Drop the in-process record store. Persistence tiers are untouched.
    pub fn clear_memory(&self) {
        self.resolver.store().clear();
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn record_store(&self) -> &RecordStore {
        self.resolver.store()
    }

    /// Tier names in priority order.
    pub fn tier_names(&self) -> Vec<String> {
        self.resolver.tier_names()
    }

    fn files_dir(&self) -> Result<&Path> {
        self.files_dir.as_deref().ok_or_else(|| {
            CacheError::InvalidConfiguration("no files directory configured".to_string())
        })
    }

    fn invalidate(&self, batch: &RecordTable) {
        for id in batch.ids() {
            self.resolver.store().invalidate(id);
        }
    }
}
