//! Observability infrastructure for the agent
//!
//! Provides:
//! - Prometheus metrics (collection latency/errors, fixture fallbacks,
//!   task runs and durations)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_histogram_vec, register_int_gauge, Histogram, HistogramVec,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for control-plane round trips (in seconds)
const COLLECTION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Histogram buckets for task durations (in seconds); tasks run far longer
/// than collection calls
const TASK_BUCKETS: &[f64] = &[0.01, 0.05, 0.25, 1.0, 5.0, 15.0, 60.0, 300.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

struct AgentMetricsInner {
    collection_latency_seconds: HistogramVec,
    collection_errors: IntGauge,
    mock_fallbacks: IntGauge,
    task_runs: IntGauge,
    task_failures: IntGauge,
    task_timeouts: IntGauge,
    tasks_running: IntGauge,
    task_duration_seconds: Histogram,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            collection_latency_seconds: register_histogram_vec!(
                "clusterpulse_collection_latency_seconds",
                "Time spent listing a resource kind from the control plane",
                &["resource"],
                COLLECTION_BUCKETS.to_vec()
            )
            .expect("Failed to register collection_latency_seconds"),

            collection_errors: register_int_gauge!(
                "clusterpulse_collection_errors_total",
                "Total number of failed collection calls"
            )
            .expect("Failed to register collection_errors"),

            mock_fallbacks: register_int_gauge!(
                "clusterpulse_mock_fallbacks_total",
                "Total number of responses served from fixture data"
            )
            .expect("Failed to register mock_fallbacks"),

            task_runs: register_int_gauge!(
                "clusterpulse_task_runs_total",
                "Total number of task executions"
            )
            .expect("Failed to register task_runs"),

            task_failures: register_int_gauge!(
                "clusterpulse_task_failures_total",
                "Total number of failed task executions"
            )
            .expect("Failed to register task_failures"),

            task_timeouts: register_int_gauge!(
                "clusterpulse_task_timeouts_total",
                "Total number of task executions terminated by timeout"
            )
            .expect("Failed to register task_timeouts"),

            tasks_running: register_int_gauge!(
                "clusterpulse_tasks_running",
                "Number of task executions currently in flight"
            )
            .expect("Failed to register tasks_running"),

            task_duration_seconds: register_histogram!(
                "clusterpulse_task_duration_seconds",
                "Wall-clock duration of task executions",
                TASK_BUCKETS.to_vec()
            )
            .expect("Failed to register task_duration_seconds"),
        }
    }
}

/// Agent metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct AgentMetrics {
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    /// Create a metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_collection_latency(&self, resource: &str, duration_secs: f64) {
        self.inner()
            .collection_latency_seconds
            .with_label_values(&[resource])
            .observe(duration_secs);
    }

    pub fn inc_collection_errors(&self) {
        self.inner().collection_errors.inc();
    }

    pub fn inc_mock_fallbacks(&self) {
        self.inner().mock_fallbacks.inc();
    }

    pub fn inc_task_runs(&self) {
        self.inner().task_runs.inc();
    }

    pub fn inc_task_failures(&self) {
        self.inner().task_failures.inc();
    }

    pub fn inc_task_timeouts(&self) {
        self.inner().task_timeouts.inc();
    }

    pub fn set_tasks_running(&self, count: i64) {
        self.inner().tasks_running.set(count);
    }

    pub fn observe_task_duration(&self, duration_secs: f64) {
        self.inner().task_duration_seconds.observe(duration_secs);
    }
}

/// Structured logger for significant agent events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "agent_started",
            instance = %self.instance,
            agent_version = %version,
            "ClusterPulse agent started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            instance = %self.instance,
            reason = %reason,
            "ClusterPulse agent shutting down"
        );
    }

    /// Log a collection failure that was answered with fixture data
    pub fn log_collection_fallback(&self, resource: &str, error: &str) {
        warn!(
            event = "collection_fallback",
            instance = %self.instance,
            resource = %resource,
            error = %error,
            "Collection failed, serving fixture data"
        );
    }

    pub fn log_task_completed(
        &self,
        script_type: &str,
        status: &str,
        exit_code: i32,
        duration_seconds: f64,
    ) {
        if exit_code == 0 {
            info!(
                event = "task_completed",
                instance = %self.instance,
                script_type = %script_type,
                status = %status,
                exit_code = exit_code,
                duration_seconds = duration_seconds,
                "Task completed"
            );
        } else {
            warn!(
                event = "task_completed",
                instance = %self.instance,
                script_type = %script_type,
                status = %status,
                exit_code = exit_code,
                duration_seconds = duration_seconds,
                "Task failed"
            );
        }
    }
}
