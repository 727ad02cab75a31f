//! Merge / write policy.
//!
//! A merge into one tier is a single `write_batch` call: full per-key
//! replacement, applied by the tier as one logical write. Merges into several
//! tiers run concurrently and independently. Nothing is rolled back: a
//! failure in one tier leaves the records durable in the others, and the
//! failures are collected into a [`PartialWriteFailure`].

use std::fmt;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::telemetry;
use crate::tier::{CacheTier, RecordTable, TierSlot};
use crate::{CacheError, ErrorKind, Result};

/// One tier's failed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierWriteFailure {
    pub tier: String,
    pub kind: &'static str,
    pub message: String,
}

/// Outcome of a fan-out write in which at least one tier failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialWriteFailure {
    /// Tiers whose write failed, in priority order.
    pub failures: Vec<TierWriteFailure>,
    /// Tiers whose write succeeded, in priority order.
    pub succeeded: Vec<String>,
}

impl PartialWriteFailure {
    /// Whether `tier` is among the failed tiers.
    pub fn failed(&self, tier: &str) -> bool {
        self.failures.iter().any(|f| f.tier == tier)
    }

    pub fn failed_tiers(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.tier.as_str())
    }
}

impl fmt::Display for PartialWriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "write failed in {} tier(s):", self.failures.len())?;
        for failure in &self.failures {
            write!(f, " [{}: {}]", failure.tier, failure.message)?;
        }
        Ok(())
    }
}

impl From<PartialWriteFailure> for CacheError {
    fn from(failure: PartialWriteFailure) -> Self {
        CacheError::PartialWrite(failure)
    }
}

/// Merge `batch` into a single tier.
///
/// Existing identifiers are fully replaced, new ones inserted.
pub async fn merge(tier: &dyn CacheTier, batch: &RecordTable) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    tier.write_batch(batch).await?;
    debug!(tier = tier.name(), count = batch.len(), "merged batch");
    Ok(())
}

/// Write `batch` into every tier concurrently.
///
/// Returns `None` when every tier accepted the write.
pub(crate) async fn fan_out(slots: &[TierSlot], batch: &RecordTable) -> Option<PartialWriteFailure> {
    let outcomes = join_all(slots.iter().map(|slot| write_slot(slot, batch))).await;
    collect(slots, outcomes, "write")
}

/// Remove `id` from every tier concurrently.
///
/// Returns whether any tier held the record, plus the failures, if any.
pub(crate) async fn fan_out_delete(
    slots: &[TierSlot],
    id: &str,
) -> (bool, Option<PartialWriteFailure>) {
    let outcomes = join_all(slots.iter().map(|slot| delete_slot(slot, id))).await;

    let removed = outcomes.iter().any(|o| matches!(o, Ok(true)));
    let outcomes = outcomes.into_iter().map(|o| o.map(|_| ())).collect();
    (removed, collect(slots, outcomes, "delete"))
}

async fn write_slot(slot: &TierSlot, batch: &RecordTable) -> Result<()> {
    let tier = slot.ready().await?;
    merge(tier, batch).await
}

async fn delete_slot(slot: &TierSlot, id: &str) -> Result<bool> {
    let tier = slot.ready().await?;
    tier.delete(id).await
}

fn collect(
    slots: &[TierSlot],
    outcomes: Vec<Result<()>>,
    operation: &'static str,
) -> Option<PartialWriteFailure> {
    let mut failures = Vec::new();
    let mut succeeded = Vec::new();

    for (slot, outcome) in slots.iter().zip(outcomes) {
        match outcome {
            Ok(()) => succeeded.push(slot.name().to_string()),
            Err(e) => {
                warn!(tier = slot.name(), operation, error = %e, "tier write failed");
                metrics::counter!(telemetry::TIER_FAILURES_TOTAL,
                    "tier" => slot.name().to_owned(),
                    "operation" => operation,
                )
                .increment(1);
                failures.push(TierWriteFailure {
                    tier: slot.name().to_string(),
                    kind: error_kind(&e).as_str(),
                    message: e.to_string(),
                });
            }
        }
    }

    if failures.is_empty() {
        return None;
    }
    metrics::counter!(telemetry::PARTIAL_WRITES_TOTAL, "operation" => operation).increment(1);
    Some(PartialWriteFailure {
        failures,
        succeeded,
    })
}

// Any failure inside a tier is reported as that tier being unavailable,
// except serialization problems which point at the record itself.
fn error_kind(e: &CacheError) -> ErrorKind {
    match e.kind() {
        ErrorKind::Serialization | ErrorKind::InvalidQuery => e.kind(),
        _ => ErrorKind::TierUnavailable,
    }
}
