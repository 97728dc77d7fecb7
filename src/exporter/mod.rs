//! Metrics Exporter Module
//!
//! Owns the process-wide metrics registry and everything that feeds it: the
//! fixed instrument taxonomy, the periodic system sampler, the HTTP
//! interception middleware, and the scrape endpoint served on its own port.

pub mod collector;
pub mod middleware;
pub mod sampler;
pub mod server;

pub use collector::{MetricsExporter, UNKNOWN_ENDPOINT};
pub use middleware::track_http;
pub use sampler::{Sampler, SAMPLE_INTERVAL};
pub use server::MetricsServer;
