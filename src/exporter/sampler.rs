//! Periodic System Sampler
//!
//! A single long-lived task that refreshes the process-level gauges,
//! independent of request traffic.

use super::MetricsExporter;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Pid, System};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Interval between system samples.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(15);

/// Refreshes uptime, memory, and task-count gauges every
/// [`SAMPLE_INTERVAL`].
///
/// The task is cancelled through the shutdown broadcast channel. [`tick`]
/// is public so tests can drive individual samples deterministically
/// instead of waiting out the interval.
///
/// [`tick`]: Sampler::tick
pub struct Sampler {
    exporter: Arc<MetricsExporter>,
    system: System,
    pid: Option<Pid>,
}

impl Sampler {
    /// Create a sampler writing into the given exporter.
    pub fn new(exporter: Arc<MetricsExporter>) -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!(error = %e, "Could not resolve current pid, memory gauge will stay at 0");
                None
            }
        };

        Self {
            exporter,
            system: System::new(),
            pid,
        }
    }

    /// Take one sample: advance the uptime counter by the interval length
    /// and refresh the memory and task gauges.
    pub fn tick(&mut self) {
        self.exporter.add_uptime(SAMPLE_INTERVAL.as_secs());

        if let Some(pid) = self.pid {
            if self.system.refresh_process(pid) {
                if let Some(process) = self.system.process(pid) {
                    self.exporter.set_memory_bytes(process.memory() as i64);
                }
            }
        }

        // Closest analogue of a goroutine count: tasks currently alive on
        // the runtime. Zero when called outside a runtime.
        let tasks = tokio::runtime::Handle::try_current()
            .map(|handle| handle.metrics().num_alive_tasks() as i64)
            .unwrap_or(0);
        self.exporter.set_task_count(tasks);
    }

    /// Sample on a fixed interval until the shutdown signal arrives.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(SAMPLE_INTERVAL);
        // A tokio interval fires immediately; consume that first tick so
        // samples land every SAMPLE_INTERVAL from startup onwards.
        interval.tick().await;

        info!(
            interval_secs = SAMPLE_INTERVAL.as_secs(),
            "System sampler started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => self.tick(),
                _ = shutdown_rx.recv() => {
                    info!("System sampler stopped");
                    break;
                }
            }
        }
    }
}
