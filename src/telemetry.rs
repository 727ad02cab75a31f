//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus, statsd);
//! without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `biomodels_cache_`. Counters end in `_total`,
//! histograms use `_seconds`.
//!
//! # Common labels
//!
//! - `source`: where a lookup was answered: "record_store", a tier name,
//!   "remote", or "miss"
//! - `tier`: persistence tier name (e.g. "json_file", "key_value")
//! - `status`: outcome: "ok", "not_found" or "error"

/// Total resolutions, labelled by the source that answered.
///
/// Labels: `source`.
pub const LOOKUPS_TOTAL: &str = "biomodels_cache_lookups_total";

/// Resolution duration in seconds, labelled like [`LOOKUPS_TOTAL`].
///
/// Labels: `source`.
pub const RESOLVE_DURATION_SECONDS: &str = "biomodels_cache_resolve_duration_seconds";

/// Total tier operations that failed and were downgraded or reported.
///
/// Labels: `tier`, `operation` ("get" | "search" | "write" | "delete" | "initialize").
pub const TIER_FAILURES_TOTAL: &str = "biomodels_cache_tier_failures_total";

/// Total remote catalog calls.
///
/// Labels: `operation` ("fetch_one" | "fetch_all"), `status`.
pub const REMOTE_FETCHES_TOTAL: &str = "biomodels_cache_remote_fetches_total";

/// Total fan-out writes where at least one tier failed.
///
/// Labels: `operation` ("write" | "delete").
pub const PARTIAL_WRITES_TOTAL: &str = "biomodels_cache_partial_writes_total";

/// Total searches, labelled by the tier that produced the result set.
///
/// Labels: `source` (tier name or "none").
pub const SEARCHES_TOTAL: &str = "biomodels_cache_searches_total";

/// Total remote retry attempts (not counting the initial request).
///
/// Labels: `operation`.
pub const RETRIES_TOTAL: &str = "biomodels_cache_retries_total";
