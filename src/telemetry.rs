//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn. Deployments install their own
//! `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `kind`: resource kind ("user" | "invite")
//! - `status`: HTTP status code of the upstream answer, or "timeout" / "unreachable"

/// Total lookups answered from the resource cache.
///
/// Labels: `kind`.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Total lookups that missed the resource cache.
///
/// Labels: `kind`.
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Total requests sent to the upstream API.
///
/// Labels: `status`.
pub const UPSTREAM_REQUESTS_TOTAL: &str = "huginn_upstream_requests_total";

/// Upstream request duration in seconds.
pub const UPSTREAM_DURATION_SECONDS: &str = "huginn_upstream_duration_seconds";

/// Total requests rejected by the rate limiter.
pub const RATE_LIMITED_TOTAL: &str = "huginn_rate_limited_total";
