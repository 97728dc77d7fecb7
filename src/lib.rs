//! Usermon Library
//!
//! A small user service instrumented with a self-registered Prometheus
//! metrics exporter. The exporter owns the process-wide registry, samples
//! system gauges on a fixed interval, intercepts every HTTP request, and
//! serves the text exposition format on a dedicated port.

pub mod api;
pub mod config;
pub mod exporter;
pub mod shutdown;
pub mod store;

pub use config::Config;
pub use exporter::MetricsExporter;
pub use shutdown::ShutdownCoordinator;
pub use store::UserStore;

/// Common error type for the service
pub type Result<T> = anyhow::Result<T>;
