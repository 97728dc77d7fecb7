//! Metrics Collector
//!
//! Central collection point for all operational telemetry. One
//! `MetricsExporter` is constructed at startup and shared as
//! `Arc<MetricsExporter>` between the request middleware, the API handlers,
//! and the periodic sampler.

use crate::Result;
use anyhow::Context;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;
use tracing::debug;

/// Endpoint label used when a request did not resolve to a known route
/// pattern. Collapsing unmatched paths keeps label cardinality bounded.
pub const UNKNOWN_ENDPOINT: &str = "unknown";

/// Request duration histogram buckets, in seconds.
const DURATION_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Collects and exports application metrics.
///
/// All instruments are internally synchronized by the prometheus primitives;
/// recording is O(1), never blocks, and never fails. Gauges under the
/// `system` subsystem are written only by the [`Sampler`](super::Sampler).
pub struct MetricsExporter {
    registry: Registry,

    // HTTP metrics
    http_requests_total: IntCounterVec,
    http_request_duration: HistogramVec,

    // Business metrics
    business_events: IntCounterVec,

    // System metrics
    memory_bytes: IntGauge,
    tokio_tasks: IntGauge,
    uptime_seconds: IntCounter,

    // Instance metadata
    build_info: IntGaugeVec,
}

impl MetricsExporter {
    /// Create a fresh registry with every instrument registered and
    /// build_info set to 1.
    ///
    /// Fails only on instrument creation or registration collisions, which
    /// are startup configuration errors; the caller is expected to abort on
    /// `Err`.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        // OS-level process metrics (CPU, memory, fds). The collector is only
        // available on Linux.
        #[cfg(target_os = "linux")]
        registry
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .context("Failed to register process collector")?;

        let http_requests_total = IntCounterVec::new(
            Opts::new(
                "requests_total",
                "Total count of HTTP requests by status, method, and endpoint",
            )
            .namespace("app")
            .subsystem("http"),
            &["status", "method", "endpoint"],
        )
        .context("Failed to create http requests_total counter")?;

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "request_duration_seconds",
                "Duration of HTTP requests in seconds",
            )
            .namespace("app")
            .subsystem("http")
            .buckets(DURATION_BUCKETS.to_vec()),
            &["status", "method", "endpoint"],
        )
        .context("Failed to create http request_duration histogram")?;

        let business_events = IntCounterVec::new(
            Opts::new(
                "events_total",
                "Total count of business events by type and user",
            )
            .namespace("app")
            .subsystem("business"),
            &["event_type", "user_id"],
        )
        .context("Failed to create business events_total counter")?;

        let memory_bytes = IntGauge::with_opts(
            Opts::new("memory_bytes", "Current memory usage in bytes")
                .namespace("app")
                .subsystem("system"),
        )
        .context("Failed to create memory_bytes gauge")?;

        let tokio_tasks = IntGauge::with_opts(
            Opts::new("tokio_tasks", "Current number of alive tokio tasks")
                .namespace("app")
                .subsystem("system"),
        )
        .context("Failed to create tokio_tasks gauge")?;

        let uptime_seconds = IntCounter::with_opts(
            Opts::new("uptime_seconds", "The uptime of the application in seconds")
                .namespace("app")
                .subsystem("system"),
        )
        .context("Failed to create uptime_seconds counter")?;

        let build_info = IntGaugeVec::new(
            Opts::new("build_info", "Build information about the application").namespace("app"),
            &["version", "runtime_version", "commit_hash"],
        )
        .context("Failed to create build_info gauge")?;

        registry
            .register(Box::new(http_requests_total.clone()))
            .context("Failed to register http_requests_total")?;
        registry
            .register(Box::new(http_request_duration.clone()))
            .context("Failed to register http_request_duration")?;
        registry
            .register(Box::new(business_events.clone()))
            .context("Failed to register business_events")?;
        registry
            .register(Box::new(memory_bytes.clone()))
            .context("Failed to register memory_bytes")?;
        registry
            .register(Box::new(tokio_tasks.clone()))
            .context("Failed to register tokio_tasks")?;
        registry
            .register(Box::new(uptime_seconds.clone()))
            .context("Failed to register uptime_seconds")?;
        registry
            .register(Box::new(build_info.clone()))
            .context("Failed to register build_info")?;

        build_info
            .with_label_values(&[
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_RUST_VERSION"),
                option_env!("USERMON_COMMIT_HASH").unwrap_or("unknown"),
            ])
            .set(1);

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration,
            business_events,
            memory_bytes,
            tokio_tasks,
            uptime_seconds,
            build_info,
        })
    }

    /// Record one completed HTTP request.
    ///
    /// `endpoint` must already be normalized to a route pattern by the
    /// caller; an empty string maps to [`UNKNOWN_ENDPOINT`]. Safe to call
    /// concurrently from any number of request contexts.
    pub fn record_http_observation(
        &self,
        status: u16,
        method: &str,
        endpoint: &str,
        duration: Duration,
    ) {
        let endpoint = if endpoint.is_empty() {
            UNKNOWN_ENDPOINT
        } else {
            endpoint
        };
        let status = status.to_string();

        self.http_requests_total
            .with_label_values(&[&status, method, endpoint])
            .inc();
        self.http_request_duration
            .with_label_values(&[&status, method, endpoint])
            .observe(duration.as_secs_f64());
    }

    /// Record a domain-level event for the given user.
    pub fn record_business_event(&self, event_type: &str, user_id: &str) {
        self.business_events
            .with_label_values(&[event_type, user_id])
            .inc();

        debug!(event_type = %event_type, user_id = %user_id, "Recorded business event");
    }

    /// Export all registered metrics in the Prometheus text exposition format.
    ///
    /// Read-only; concurrent recording keeps going while the snapshot is
    /// taken (consistency is per-instrument, not cross-instrument).
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        encoder
            .encode_to_string(&metric_families)
            .context("Failed to encode Prometheus metrics")
    }

    /// Content type of the text exposition format.
    pub fn format_type() -> &'static str {
        prometheus::TEXT_FORMAT
    }

    // Sampler write path. The system gauges are never touched by request
    // handlers.

    pub(crate) fn add_uptime(&self, secs: u64) {
        self.uptime_seconds.inc_by(secs);
    }

    pub(crate) fn set_memory_bytes(&self, bytes: i64) {
        self.memory_bytes.set(bytes);
    }

    pub(crate) fn set_task_count(&self, tasks: i64) {
        self.tokio_tasks.set(tasks);
    }

    // Read accessors, used by tests and diagnostics.

    /// Get the request count for a (status, method, endpoint) label tuple.
    pub fn get_http_request_count(&self, status: u16, method: &str, endpoint: &str) -> u64 {
        self.http_requests_total
            .with_label_values(&[&status.to_string(), method, endpoint])
            .get()
    }

    /// Get the number of duration samples for a (status, method, endpoint)
    /// label tuple.
    pub fn get_http_duration_samples(&self, status: u16, method: &str, endpoint: &str) -> u64 {
        self.http_request_duration
            .with_label_values(&[&status.to_string(), method, endpoint])
            .get_sample_count()
    }

    /// Get the event count for an (event_type, user_id) label tuple.
    pub fn get_business_event_count(&self, event_type: &str, user_id: &str) -> u64 {
        self.business_events
            .with_label_values(&[event_type, user_id])
            .get()
    }

    /// Get the accumulated uptime counter.
    pub fn get_uptime_seconds(&self) -> u64 {
        self.uptime_seconds.get()
    }

    /// Get the last sampled process memory, in bytes.
    pub fn get_memory_bytes(&self) -> i64 {
        self.memory_bytes.get()
    }

    /// Get the last sampled tokio task count.
    pub fn get_task_count(&self) -> i64 {
        self.tokio_tasks.get()
    }

    /// Get the build_info series value (always 1 once constructed).
    pub fn get_build_info(&self) -> i64 {
        self.build_info
            .with_label_values(&[
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_RUST_VERSION"),
                option_env!("USERMON_COMMIT_HASH").unwrap_or("unknown"),
            ])
            .get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_sets_build_info() {
        let exporter = MetricsExporter::new().unwrap();
        let body = exporter.encode_text().unwrap();

        assert!(body.contains("app_build_info{"));
        assert!(body.contains(&format!("version=\"{}\"", env!("CARGO_PKG_VERSION"))));
        assert_eq!(exporter.get_build_info(), 1);
    }

    #[test]
    fn test_http_observation_updates_counter_and_histogram() {
        let exporter = MetricsExporter::new().unwrap();

        exporter.record_http_observation(200, "GET", "/api/v1/users", Duration::from_millis(2));
        exporter.record_http_observation(200, "GET", "/api/v1/users", Duration::from_millis(4));

        assert_eq!(exporter.get_http_request_count(200, "GET", "/api/v1/users"), 2);
        assert_eq!(
            exporter.get_http_duration_samples(200, "GET", "/api/v1/users"),
            2
        );
        assert_eq!(exporter.get_http_request_count(404, "GET", "/api/v1/users"), 0);
    }

    #[test]
    fn test_empty_endpoint_maps_to_unknown() {
        let exporter = MetricsExporter::new().unwrap();

        exporter.record_http_observation(404, "GET", "", Duration::from_millis(1));

        assert_eq!(
            exporter.get_http_request_count(404, "GET", UNKNOWN_ENDPOINT),
            1
        );
        let body = exporter.encode_text().unwrap();
        assert!(!body.contains("endpoint=\"\""));
    }

    #[test]
    fn test_business_events_are_per_tuple() {
        let exporter = MetricsExporter::new().unwrap();

        exporter.record_business_event("login", "alice");
        exporter.record_business_event("login", "alice");

        assert_eq!(exporter.get_business_event_count("login", "alice"), 2);
        assert_eq!(exporter.get_business_event_count("login", "bob"), 0);
        assert_eq!(exporter.get_business_event_count("register", "alice"), 0);
    }
}
