//! Tier resolver with fallback chain semantics.
//!
//! Tiers are stored in priority order (index 0 = highest). A lookup probes
//! them in order and stops at the first hit:
//!
//! ```text
//! resolve("BIOMD0000000012")
//!         │
//!         ▼
//!   ┌──────────────┐  hit
//!   │ RecordStore  │ ─────► return (no I/O)
//!   └──────┬───────┘
//!          │ miss
//!          ▼
//!   ┌──────────────┐  hit
//!   │ tier 0, 1, … │ ─────► backfill RecordStore, return
//!   └──────┬───────┘
//!          │ all miss (tier errors downgraded to misses)
//!          ▼
//!   ┌──────────────┐  found
//!   │ catalog      │ ─────► fan-out write to every tier, return
//!   └──────┬───────┘
//!          │ NotFound
//!          ▼
//!        Ok(None)
//! ```
//!
//! Later tiers are never consulted once an earlier one answers, even if the
//! earlier copy is stale. There is no tier-to-tier consistency protocol.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::catalog::CatalogGateway;
use crate::merge::{self, PartialWriteFailure};
use crate::telemetry;
use crate::tier::{RecordStore, RecordTable, TierSlot};
use crate::types::{CacheQuery, ModelRecord, SearchResult};
use crate::{CacheError, Result};

/// Refill behaviour of the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// On a hit in tier `n`, also write the record into tiers `0..n`.
    /// Default: false (only the record store is refilled).
    pub backfill_tiers: bool,
    /// On a remote fetch, write the record into every tier. Default: true.
    pub write_through_on_fetch: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            backfill_tiers: false,
            write_through_on_fetch: true,
        }
    }
}

/// Where a resolution was answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "tier")]
pub enum ResolutionSource {
    RecordStore,
    Tier(String),
    Remote,
}

impl ResolutionSource {
    /// Metric label for this source.
    pub fn label(&self) -> &str {
        match self {
            ResolutionSource::RecordStore => "record_store",
            ResolutionSource::Tier(name) => name,
            ResolutionSource::Remote => "remote",
        }
    }
}

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub record: ModelRecord,
    pub source: ResolutionSource,
    /// Tiers that failed to store a fetched or backfilled record. The read
    /// itself still succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_failure: Option<PartialWriteFailure>,
}

/// Ordered fallback chain over the record store, persistence tiers and the
/// remote catalog.
pub struct TierResolver {
    store: RecordStore,
    tiers: Vec<TierSlot>,
    catalog: Option<Arc<dyn CatalogGateway>>,
    config: ResolverConfig,
}

impl TierResolver {
    /// Build a resolver over `tiers` in priority order.
    pub(crate) fn new(
        store: RecordStore,
        tiers: Vec<TierSlot>,
        catalog: Option<Arc<dyn CatalogGateway>>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            store,
            tiers,
            catalog,
            config,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub(crate) fn tiers(&self) -> &[TierSlot] {
        &self.tiers
    }

    pub fn tier_names(&self) -> Vec<String> {
        self.tiers.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn catalog(&self) -> Option<&Arc<dyn CatalogGateway>> {
        self.catalog.as_ref()
    }

    /// Initialize every tier concurrently.
    ///
    /// Tiers are otherwise initialized lazily on first use. Failures are
    /// logged and returned per tier; a failed tier is retried on next access.
    pub async fn initialize(&self) -> Vec<(String, Result<()>)> {
        join_all(self.tiers.iter().map(|slot| async move {
            let outcome = slot.ready().await.map(|_| ());
            if let Err(e) = &outcome {
                warn!(tier = slot.name(), error = %e, "tier initialization failed");
                Self::record_tier_failure(slot.name(), "initialize", e);
            }
            (slot.name().to_string(), outcome)
        }))
        .await
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Resolve a canonical identifier.
    ///
    /// `Ok(None)` means no tier holds the record and the catalog does not
    /// know it (or there is no catalog). Tier failures are downgraded to
    /// misses; only a catalog failure, or every tier failing with no catalog
    /// configured, escalates.
    #[instrument(skip(self), fields(operation = "resolve"))]
    pub async fn resolve(&self, id: &str) -> Result<Option<Resolution>> {
        let start = Instant::now();

        if let Some(record) = self.store.get(id) {
            Self::record_lookup("record_store", start);
            return Ok(Some(Resolution {
                record,
                source: ResolutionSource::RecordStore,
                write_failure: None,
            }));
        }

        let mut last_err = None;
        let mut failed = 0;
        for (index, slot) in self.tiers.iter().enumerate() {
            match Self::probe(slot, id).await {
                Ok(Some(record)) => {
                    debug!(tier = slot.name(), id, "tier hit");
                    self.store.insert(record.clone());
                    let write_failure = if self.config.backfill_tiers && index > 0 {
                        merge::fan_out(&self.tiers[..index], &RecordTable::from(record.clone()))
                            .await
                    } else {
                        None
                    };
                    Self::record_lookup(slot.name(), start);
                    return Ok(Some(Resolution {
                        record,
                        source: ResolutionSource::Tier(slot.name().to_string()),
                        write_failure,
                    }));
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!(tier = slot.name(), id, error = %e, "tier lookup failed, trying next");
                    Self::record_tier_failure(slot.name(), "get", &e);
                    failed += 1;
                    last_err = Some(e);
                }
            }
        }

        let Some(catalog) = &self.catalog else {
            Self::record_lookup("miss", start);
            return match last_err {
                Some(e) if failed == self.tiers.len() => Err(e),
                _ => Ok(None),
            };
        };

        match catalog.fetch_one(id).await {
            Ok(mut record) => {
                Self::record_fetch("fetch_one", "ok");
                record.id = id.to_string();
                record.last_updated = Some(Utc::now().to_rfc3339());
                self.store.insert(record.clone());
                let write_failure = if self.config.write_through_on_fetch {
                    merge::fan_out(&self.tiers, &RecordTable::from(record.clone())).await
                } else {
                    None
                };
                Self::record_lookup("remote", start);
                Ok(Some(Resolution {
                    record,
                    source: ResolutionSource::Remote,
                    write_failure,
                }))
            }
            Err(CacheError::NotFound(_)) => {
                Self::record_fetch("fetch_one", "not_found");
                Self::record_lookup("miss", start);
                Ok(None)
            }
            Err(e) => {
                Self::record_fetch("fetch_one", "error");
                Self::record_lookup("miss", start);
                Err(match e {
                    e @ CacheError::RemoteUnavailable { .. } => e,
                    other => CacheError::remote(other.to_string()),
                })
            }
        }
    }

    async fn probe(slot: &TierSlot, id: &str) -> Result<Option<ModelRecord>> {
        slot.ready().await?.get_by_key(id).await
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Search the first tier with a non-empty ranked result, then paginate.
    ///
    /// A non-empty result from a higher-priority tier suppresses lower tiers
    /// entirely; results are never merged across tiers.
    #[instrument(skip(self, query), fields(operation = "search", term = %query.term))]
    pub async fn search(&self, query: &CacheQuery) -> Result<Vec<SearchResult>> {
        let mut last_err = None;
        let mut failed = 0;

        for slot in &self.tiers {
            let ranked = match slot.ready().await {
                Ok(tier) => tier.search(query).await,
                Err(e) => Err(e),
            };
            match ranked {
                Ok(results) if results.is_empty() => continue,
                Ok(results) => {
                    debug!(tier = slot.name(), hits = results.len(), "search answered");
                    metrics::counter!(telemetry::SEARCHES_TOTAL, "source" => slot.name().to_owned())
                        .increment(1);
                    return Ok(query.pagination.apply(results));
                }
                Err(e) => {
                    warn!(tier = slot.name(), error = %e, "tier search failed, trying next");
                    Self::record_tier_failure(slot.name(), "search", &e);
                    failed += 1;
                    last_err = Some(e);
                }
            }
        }

        metrics::counter!(telemetry::SEARCHES_TOTAL, "source" => "none").increment(1);
        match last_err {
            Some(e) if failed == self.tiers.len() => Err(e),
            _ => Ok(Vec::new()),
        }
    }

    // ========================================================================
    // Metrics helpers
    // ========================================================================

    fn record_lookup(source: &str, start: Instant) {
        let elapsed = start.elapsed().as_secs_f64();
        metrics::counter!(telemetry::LOOKUPS_TOTAL, "source" => source.to_owned()).increment(1);
        metrics::histogram!(telemetry::RESOLVE_DURATION_SECONDS, "source" => source.to_owned())
            .record(elapsed);
    }

    pub(crate) fn record_fetch(operation: &'static str, status: &'static str) {
        metrics::counter!(telemetry::REMOTE_FETCHES_TOTAL,
            "operation" => operation,
            "status" => status,
        )
        .increment(1);
    }

    fn record_tier_failure(tier: &str, operation: &'static str, e: &CacheError) {
        debug!(tier, operation, kind = %e.kind(), "recording tier failure");
        metrics::counter!(telemetry::TIER_FAILURES_TOTAL,
            "tier" => tier.to_owned(),
            "operation" => operation,
        )
        .increment(1);
    }
}
