//! Static fixture data for degraded operation
//!
//! A second [`ClusterMetricsSource`] implementation serving fixed demo
//! records. The API layer substitutes these when the live collector reports
//! a failure (or nothing at all), so the dashboard keeps rendering while
//! the control plane is away.

use super::{ClusterMetricsSource, CollectResult};
use crate::models::{
    AllocatableResources, ClusterOverview, DeploymentRecord, NamespaceRecord, NodeRecord,
    PodRecord, ServicePortRecord, ServiceRecord,
};
use async_trait::async_trait;

/// Fixture-backed cluster source. Infallible by construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticClusterData;

impl StaticClusterData {
    pub fn new() -> Self {
        Self
    }

    pub fn nodes(&self) -> Vec<NodeRecord> {
        vec![
            node("node-1", 8, 16_000_000_000),
            node("node-2", 4, 8_000_000_000),
        ]
    }

    pub fn pods(&self) -> Vec<PodRecord> {
        vec![
            pod("nginx-deployment-abc123", "default", "Running", "node-1", "10.244.0.12", 0, "2d"),
            pod("redis-master-xyz789", "default", "Running", "node-2", "10.244.1.8", 1, "5d"),
            pod("frontend-app-123456", "production", "Running", "node-1", "10.244.0.31", 0, "1d"),
            pod("backend-api-789012", "production", "Pending", "", "", 0, "1h"),
            pod("monitoring-prometheus-345678", "monitoring", "Running", "node-1", "10.244.0.44", 2, "7d"),
        ]
    }

    pub fn services(&self) -> Vec<ServiceRecord> {
        vec![
            service("kubernetes", "default", "ClusterIP", "10.96.0.1", 443, 1),
            service("nginx-service", "default", "LoadBalancer", "10.96.100.50", 80, 2),
            service("redis-service", "default", "ClusterIP", "10.96.100.51", 6379, 1),
        ]
    }

    pub fn namespaces(&self) -> Vec<NamespaceRecord> {
        ["default", "kube-system", "production", "monitoring", "development"]
            .into_iter()
            .map(|name| NamespaceRecord {
                name: name.to_string(),
                status: "Active".to_string(),
            })
            .collect()
    }

    pub fn deployments(&self) -> Vec<DeploymentRecord> {
        vec![
            deployment("nginx-deployment", "default", 3, 3, "10d"),
            deployment("frontend-app", "production", 5, 5, "3d"),
            deployment("backend-api", "production", 3, 2, "3d"),
        ]
    }

    pub fn overview(&self) -> ClusterOverview {
        ClusterOverview::from_records(
            &self.nodes(),
            &self.pods(),
            &self.services(),
            &self.namespaces(),
        )
    }
}

#[async_trait]
impl ClusterMetricsSource for StaticClusterData {
    async fn get_nodes(&self) -> CollectResult<NodeRecord> {
        Ok(self.nodes())
    }

    async fn get_pods(&self, namespace: Option<&str>) -> CollectResult<PodRecord> {
        Ok(filter_namespace(self.pods(), namespace, |p| &p.namespace))
    }

    async fn get_services(&self, namespace: Option<&str>) -> CollectResult<ServiceRecord> {
        Ok(filter_namespace(self.services(), namespace, |s| &s.namespace))
    }

    async fn get_namespaces(&self) -> CollectResult<NamespaceRecord> {
        Ok(self.namespaces())
    }

    async fn get_deployments(&self, namespace: Option<&str>) -> CollectResult<DeploymentRecord> {
        Ok(filter_namespace(self.deployments(), namespace, |d| &d.namespace))
    }
}

fn filter_namespace<T>(
    records: Vec<T>,
    namespace: Option<&str>,
    key: impl Fn(&T) -> &str,
) -> Vec<T> {
    match namespace {
        Some(ns) => records.into_iter().filter(|r| key(r) == ns).collect(),
        None => records,
    }
}

fn node(name: &str, cpu_cores: u32, memory_bytes: u64) -> NodeRecord {
    NodeRecord {
        name: name.to_string(),
        status: "Ready".to_string(),
        cpu_cores,
        memory_bytes,
        allocatable: AllocatableResources {
            cpu_cores,
            memory_bytes: memory_bytes - memory_bytes / 10,
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn pod(
    name: &str,
    namespace: &str,
    status: &str,
    node: &str,
    ip: &str,
    restarts: i32,
    age: &str,
) -> PodRecord {
    PodRecord {
        name: name.to_string(),
        namespace: namespace.to_string(),
        status: status.to_string(),
        node: node.to_string(),
        ip: ip.to_string(),
        restarts,
        age: age.to_string(),
    }
}

fn service(
    name: &str,
    namespace: &str,
    service_type: &str,
    cluster_ip: &str,
    port: i32,
    endpoints: usize,
) -> ServiceRecord {
    ServiceRecord {
        name: name.to_string(),
        namespace: namespace.to_string(),
        service_type: service_type.to_string(),
        cluster_ip: cluster_ip.to_string(),
        ports: vec![ServicePortRecord {
            port,
            protocol: "TCP".to_string(),
        }],
        endpoints,
    }
}

fn deployment(name: &str, namespace: &str, replicas: i32, ready: i32, age: &str) -> DeploymentRecord {
    DeploymentRecord {
        name: name.to_string(),
        namespace: namespace.to_string(),
        replicas,
        ready_replicas: ready,
        available_replicas: ready,
        age: age.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_is_never_empty() {
        let fixture = StaticClusterData::new();
        assert!(!fixture.get_nodes().await.unwrap().is_empty());
        assert!(!fixture.get_pods(None).await.unwrap().is_empty());
        assert!(!fixture.get_services(None).await.unwrap().is_empty());
        assert!(!fixture.get_namespaces().await.unwrap().is_empty());
        assert!(!fixture.get_deployments(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_namespace_filter_applies() {
        let fixture = StaticClusterData::new();
        let pods = fixture.get_pods(Some("production")).await.unwrap();
        assert_eq!(pods.len(), 2);
        assert!(pods.iter().all(|p| p.namespace == "production"));

        let none = fixture.get_pods(Some("nonexistent")).await.unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_overview_matches_fixture_counts() {
        let fixture = StaticClusterData::new();
        let overview = fixture.overview();
        assert_eq!(overview.cluster.nodes, 2);
        assert_eq!(overview.cluster.pods, 5);
        assert_eq!(overview.pods.running, 4);
        assert_eq!(overview.pods.pending, 1);
        assert_eq!(overview.resources.cpu_cores, 12);
    }
}
