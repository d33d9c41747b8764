//! Wire-level records produced by the agent

use serde::{Deserialize, Serialize};

/// Node capacity and condition summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub status: String,
    pub cpu_cores: u32,
    pub memory_bytes: u64,
    pub allocatable: AllocatableResources,
}

/// Allocatable slice of a node's capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatableResources {
    pub cpu_cores: u32,
    pub memory_bytes: u64,
}

/// Pod placement and lifecycle summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodRecord {
    pub name: String,
    pub namespace: String,
    pub status: String,
    pub node: String,
    pub ip: String,
    pub restarts: i32,
    pub age: String,
}

/// Service exposure summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub cluster_ip: String,
    pub ports: Vec<ServicePortRecord>,
    pub endpoints: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePortRecord {
    pub port: i32,
    pub protocol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub name: String,
    pub status: String,
}

/// Deployment replica summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub ready_replicas: i32,
    pub available_replicas: i32,
    pub age: String,
}

/// Single-element stand-in returned to callers when a collection call fails.
///
/// `mock` is always true so dashboard clients can branch on it uniformly
/// across every resource kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorSentinel {
    pub error: String,
    pub mock: bool,
}

impl ErrorSentinel {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            mock: true,
        }
    }
}

/// Aggregate cluster snapshot for the dashboard landing page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterOverview {
    pub cluster: OverviewCounts,
    pub resources: OverviewResources,
    pub pods: OverviewPodPhases,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewCounts {
    pub nodes: usize,
    pub pods: usize,
    pub services: usize,
    pub namespaces: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewResources {
    pub cpu_cores: u64,
    pub memory_gb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewPodPhases {
    pub running: usize,
    pub pending: usize,
    pub other: usize,
}

impl ClusterOverview {
    /// Aggregate per-kind records into the dashboard snapshot.
    pub fn from_records(
        nodes: &[NodeRecord],
        pods: &[PodRecord],
        services: &[ServiceRecord],
        namespaces: &[NamespaceRecord],
    ) -> Self {
        let total_cpu: u64 = nodes.iter().map(|n| u64::from(n.cpu_cores)).sum();
        let total_memory: u64 = nodes.iter().map(|n| n.memory_bytes).sum();
        let memory_gb = (total_memory as f64 / (1u64 << 30) as f64 * 100.0).round() / 100.0;

        let running = pods.iter().filter(|p| p.status == "Running").count();
        let pending = pods.iter().filter(|p| p.status == "Pending").count();

        Self {
            cluster: OverviewCounts {
                nodes: nodes.len(),
                pods: pods.len(),
                services: services.len(),
                namespaces: namespaces.len(),
            },
            resources: OverviewResources {
                cpu_cores: total_cpu,
                memory_gb,
            },
            pods: OverviewPodPhases {
                running,
                pending,
                other: pods.len() - running - pending,
            },
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Outcome of a single script execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Failed,
}

/// Uniform result record for one `run_script` invocation.
///
/// Every field is populated on every path, including timeouts and launch
/// failures; the runner never raises to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecutionResult {
    pub status: TaskStatus,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_seconds: f64,
}

/// In-flight task entry kept by the API layer for visibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningTask {
    pub id: u64,
    pub script_type: String,
    pub started_at: i64,
}
