//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use biomodels_cache::telemetry;
use biomodels_cache::{
    Biomodels, CacheError, CacheQuery, CacheTier, CatalogGateway, KeyValueTier, ModelRecord,
    RecordTable, Result,
};

// ============================================================================
// Mocks
// ============================================================================

struct MockCatalog;

#[async_trait]
impl CatalogGateway for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_one(&self, id: &str) -> Result<ModelRecord> {
        if id == "BIOMD0000000404" {
            return Err(CacheError::NotFound(id.to_string()));
        }
        Ok(ModelRecord::new(id).with_title("remote"))
    }

    async fn fetch_all(&self) -> Result<Vec<ModelRecord>> {
        Ok(vec![ModelRecord::new("BIOMD0000000001")])
    }
}

struct FailingTier;

#[async_trait]
impl CacheTier for FailingTier {
    fn name(&self) -> &str {
        "failing"
    }

    async fn get_by_key(&self, _id: &str) -> Result<Option<ModelRecord>> {
        Err(CacheError::tier("failing", "down"))
    }

    async fn records(&self) -> Result<RecordTable> {
        Err(CacheError::tier("failing", "down"))
    }

    async fn write_batch(&self, _batch: &RecordTable) -> Result<()> {
        Err(CacheError::tier("failing", "down"))
    }

    async fn delete(&self, _id: &str) -> Result<bool> {
        Err(CacheError::tier("failing", "down"))
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for a metric name whose `label` equals `value`.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn remote_fetch_records_lookup_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let client = Biomodels::builder()
                    .key_value()
                    .catalog(Arc::new(MockCatalog))
                    .build()?;
                client.get_model("12").await?;
                client.get_model("12").await
            })
        })
    });
    assert!(result.unwrap().is_some());

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::LOOKUPS_TOTAL), 2);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::LOOKUPS_TOTAL, "source", "remote"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::LOOKUPS_TOTAL, "source", "record_store"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::REMOTE_FETCHES_TOTAL, "status", "ok"),
        1
    );
    assert!(
        has_histogram(&snapshot, telemetry::RESOLVE_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn not_found_records_miss() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let client = Biomodels::builder()
                    .key_value()
                    .catalog(Arc::new(MockCatalog))
                    .build()?;
                client.get_model("404").await
            })
        })
    });
    assert!(result.unwrap().is_none());

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(&snapshot, telemetry::LOOKUPS_TOTAL, "source", "miss"),
        1
    );
    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::REMOTE_FETCHES_TOTAL,
            "status",
            "not_found"
        ),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failing_tier_records_failure_and_partial_write() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let client = Biomodels::builder()
                    .tier(Arc::new(FailingTier))
                    .key_value()
                    .catalog(Arc::new(MockCatalog))
                    .build()?;
                client.get_model("7").await
            })
        })
    });
    let resolution = result.unwrap().unwrap();
    assert!(resolution.write_failure.is_some());

    let snapshot = snapshotter.snapshot().into_vec();

    // One failed read, one failed write.
    assert_eq!(
        counter_with_label(&snapshot, telemetry::TIER_FAILURES_TOTAL, "tier", "failing"),
        2
    );
    assert_eq!(counter_total(&snapshot, telemetry::PARTIAL_WRITES_TOTAL), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn search_records_answering_tier() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let tier = Arc::new(KeyValueTier::in_memory());
                tier.write_batch(&RecordTable::from(
                    ModelRecord::new("BIOMD0000000001").with_title("glycolysis"),
                ))
                .await?;
                let client = Biomodels::builder().tier(tier).build()?;
                client.search(&CacheQuery::new("glycolysis")).await?;
                client.search(&CacheQuery::new("absent")).await
            })
        })
    });
    assert!(result.unwrap().is_empty());

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(&snapshot, telemetry::SEARCHES_TOTAL, "source", "key_value"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::SEARCHES_TOTAL, "source", "none"),
        1
    );
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let client = Biomodels::builder()
        .key_value()
        .catalog(Arc::new(MockCatalog))
        .build()
        .unwrap();
    let _result = client.get_model("12").await.unwrap();
}
