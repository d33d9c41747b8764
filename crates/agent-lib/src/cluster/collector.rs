//! Live collector backed by the control plane
//!
//! One list query per resource kind, each item mapped through the
//! normalization rules into a wire record. Collection is all-or-nothing: a
//! failure to acquire the session, issue the query, or map any single item
//! fails the whole call, so callers never have to reason about partial
//! lists. The only exception is the per-service endpoints lookup, which is
//! best-effort enrichment and degrades to zero on its own.

use super::{ClusterClient, ClusterError, ClusterMetricsSource, CollectResult};
use crate::models::{
    AllocatableResources, DeploymentRecord, NamespaceRecord, NodeRecord, PodRecord,
    ServicePortRecord, ServiceRecord,
};
use crate::quantity;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Endpoints, Namespace, Node, Pod, Service};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::ListParams;
use kube::{Api, Client};
use tracing::debug;

/// Collector over the live control plane session.
pub struct Collector {
    client: ClusterClient,
}

impl Collector {
    pub fn new(client: ClusterClient) -> Self {
        Self { client }
    }

    async fn session(&self) -> Result<Client, ClusterError> {
        self.client.acquire().await.map(Clone::clone)
    }

    fn scoped_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        match namespace {
            Some(ns) => Api::namespaced(client, ns),
            None => Api::all(client),
        }
    }
}

#[async_trait]
impl ClusterMetricsSource for Collector {
    async fn get_nodes(&self) -> CollectResult<NodeRecord> {
        let client = self.session().await?;
        let api: Api<Node> = Api::all(client);
        let nodes = api.list(&ListParams::default()).await?;
        nodes.items.into_iter().map(node_record).collect()
    }

    async fn get_pods(&self, namespace: Option<&str>) -> CollectResult<PodRecord> {
        let client = self.session().await?;
        let api: Api<Pod> = Self::scoped_api(client, namespace);
        let pods = api.list(&ListParams::default()).await?;
        pods.items.into_iter().map(pod_record).collect()
    }

    async fn get_services(&self, namespace: Option<&str>) -> CollectResult<ServiceRecord> {
        let client = self.session().await?;
        let api: Api<Service> = Self::scoped_api(client.clone(), namespace);
        let services = api.list(&ListParams::default()).await?;

        let mut records = Vec::with_capacity(services.items.len());
        for service in services.items {
            let mut record = service_record(service)?;
            record.endpoints =
                endpoint_subsets(&client, &record.namespace, &record.name).await;
            records.push(record);
        }
        Ok(records)
    }

    async fn get_namespaces(&self) -> CollectResult<NamespaceRecord> {
        let client = self.session().await?;
        let api: Api<Namespace> = Api::all(client);
        let namespaces = api.list(&ListParams::default()).await?;
        namespaces.items.into_iter().map(namespace_record).collect()
    }

    async fn get_deployments(&self, namespace: Option<&str>) -> CollectResult<DeploymentRecord> {
        let client = self.session().await?;
        let api: Api<Deployment> = Self::scoped_api(client, namespace);
        let deployments = api.list(&ListParams::default()).await?;
        deployments
            .items
            .into_iter()
            .map(deployment_record)
            .collect()
    }
}

/// Count a service's endpoint subsets. Best-effort: a failed lookup reports
/// zero rather than failing the collection call.
async fn endpoint_subsets(client: &Client, namespace: &str, name: &str) -> usize {
    let api: Api<Endpoints> = Api::namespaced(client.clone(), namespace);
    match api.get(name).await {
        Ok(endpoints) => endpoints.subsets.map(|s| s.len()).unwrap_or(0),
        Err(err) => {
            debug!(service = %name, namespace = %namespace, error = %err,
                "Endpoints lookup failed, reporting zero subsets");
            0
        }
    }
}

fn malformed(kind: &'static str, detail: impl Into<String>) -> ClusterError {
    ClusterError::Malformed {
        kind,
        detail: detail.into(),
    }
}

fn node_record(node: Node) -> Result<NodeRecord, ClusterError> {
    let name = node
        .metadata
        .name
        .ok_or_else(|| malformed("node", "missing metadata.name"))?;
    let status = node.status.unwrap_or_default();

    let condition = status
        .conditions
        .as_ref()
        .and_then(|c| c.last())
        .map(|c| c.type_.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    let capacity = status.capacity.unwrap_or_default();
    let allocatable = status.allocatable.unwrap_or_default();

    Ok(NodeRecord {
        name,
        status: condition,
        cpu_cores: cores_or_default(capacity.get("cpu")),
        memory_bytes: memory_bytes(capacity.get("memory")),
        allocatable: AllocatableResources {
            cpu_cores: cores_or_default(allocatable.get("cpu")),
            memory_bytes: memory_bytes(allocatable.get("memory")),
        },
    })
}

fn pod_record(pod: Pod) -> Result<PodRecord, ClusterError> {
    let name = pod
        .metadata
        .name
        .ok_or_else(|| malformed("pod", "missing metadata.name"))?;
    let namespace = pod
        .metadata
        .namespace
        .ok_or_else(|| malformed("pod", format!("{name}: missing metadata.namespace")))?;

    let status = pod.status.unwrap_or_default();
    let restarts = status
        .container_statuses
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|c| c.restart_count)
        .sum();

    Ok(PodRecord {
        name,
        namespace,
        status: status.phase.unwrap_or_else(|| "Unknown".to_string()),
        node: pod.spec.and_then(|s| s.node_name).unwrap_or_default(),
        ip: status.pod_ip.unwrap_or_default(),
        restarts,
        age: quantity::format_age(pod.metadata.creation_timestamp.map(|t| t.0)),
    })
}

fn service_record(service: Service) -> Result<ServiceRecord, ClusterError> {
    let name = service
        .metadata
        .name
        .ok_or_else(|| malformed("service", "missing metadata.name"))?;
    let namespace = service
        .metadata
        .namespace
        .ok_or_else(|| malformed("service", format!("{name}: missing metadata.namespace")))?;

    let spec = service.spec.unwrap_or_default();
    let ports = spec
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|p| ServicePortRecord {
            port: p.port,
            protocol: p.protocol.unwrap_or_else(|| "TCP".to_string()),
        })
        .collect();

    Ok(ServiceRecord {
        name,
        namespace,
        service_type: spec.type_.unwrap_or_else(|| "ClusterIP".to_string()),
        cluster_ip: spec.cluster_ip.unwrap_or_default(),
        ports,
        // Filled in by the caller's endpoints lookup
        endpoints: 0,
    })
}

fn namespace_record(namespace: Namespace) -> Result<NamespaceRecord, ClusterError> {
    let name = namespace
        .metadata
        .name
        .ok_or_else(|| malformed("namespace", "missing metadata.name"))?;
    Ok(NamespaceRecord {
        name,
        status: namespace
            .status
            .and_then(|s| s.phase)
            .unwrap_or_else(|| "Unknown".to_string()),
    })
}

fn deployment_record(deployment: Deployment) -> Result<DeploymentRecord, ClusterError> {
    let name = deployment
        .metadata
        .name
        .ok_or_else(|| malformed("deployment", "missing metadata.name"))?;
    let namespace = deployment
        .metadata
        .namespace
        .ok_or_else(|| malformed("deployment", format!("{name}: missing metadata.namespace")))?;

    let status = deployment.status.unwrap_or_default();

    Ok(DeploymentRecord {
        name,
        namespace,
        replicas: deployment.spec.and_then(|s| s.replicas).unwrap_or(0),
        ready_replicas: status.ready_replicas.unwrap_or(0),
        available_replicas: status.available_replicas.unwrap_or(0),
        age: quantity::format_age(deployment.metadata.creation_timestamp.map(|t| t.0)),
    })
}

fn cores_or_default(quantity: Option<&Quantity>) -> u32 {
    quantity.and_then(|q| quantity::parse_cores(&q.0)).unwrap_or(1)
}

fn memory_bytes(quantity: Option<&Quantity>) -> u64 {
    quantity.map(|q| quantity::parse_memory(&q.0)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{
        ContainerStatus, NodeCondition, NodeStatus, PodSpec, PodStatus, ServicePort, ServiceSpec,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use kube::core::ObjectMeta;
    use std::collections::BTreeMap;

    fn meta(name: &str, namespace: Option<&str>) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: namespace.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_node_record_normalizes_quantities() {
        let mut capacity = BTreeMap::new();
        capacity.insert("cpu".to_string(), Quantity("8".to_string()));
        capacity.insert("memory".to_string(), Quantity("16Gi".to_string()));
        let mut allocatable = BTreeMap::new();
        allocatable.insert("cpu".to_string(), Quantity("7".to_string()));
        allocatable.insert("memory".to_string(), Quantity("15Gi".to_string()));

        let node = Node {
            metadata: meta("node-1", None),
            status: Some(NodeStatus {
                capacity: Some(capacity),
                allocatable: Some(allocatable),
                conditions: Some(vec![
                    NodeCondition {
                        type_: "MemoryPressure".to_string(),
                        status: "False".to_string(),
                        ..Default::default()
                    },
                    NodeCondition {
                        type_: "Ready".to_string(),
                        status: "True".to_string(),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let record = node_record(node).unwrap();
        assert_eq!(record.name, "node-1");
        assert_eq!(record.status, "Ready");
        assert_eq!(record.cpu_cores, 8);
        assert_eq!(record.memory_bytes, 16 * (1u64 << 30));
        assert_eq!(record.allocatable.cpu_cores, 7);
        assert_eq!(record.allocatable.memory_bytes, 15 * (1u64 << 30));
    }

    #[test]
    fn test_node_record_defaults_when_unparsable() {
        let mut capacity = BTreeMap::new();
        capacity.insert("cpu".to_string(), Quantity("7500m".to_string()));
        capacity.insert("memory".to_string(), Quantity("weird".to_string()));

        let node = Node {
            metadata: meta("node-2", None),
            status: Some(NodeStatus {
                capacity: Some(capacity),
                ..Default::default()
            }),
            ..Default::default()
        };

        let record = node_record(node).unwrap();
        assert_eq!(record.status, "Unknown");
        assert_eq!(record.cpu_cores, 1);
        assert_eq!(record.memory_bytes, 0);
        assert_eq!(record.allocatable.cpu_cores, 1);
    }

    #[test]
    fn test_node_record_without_name_is_malformed() {
        let node = Node::default();
        let err = node_record(node).unwrap_err();
        assert!(matches!(err, ClusterError::Malformed { kind: "node", .. }));
    }

    #[test]
    fn test_pod_record_sums_restarts() {
        let container = |restarts: i32| ContainerStatus {
            restart_count: restarts,
            ..Default::default()
        };

        let pod = Pod {
            metadata: ObjectMeta {
                creation_timestamp: Some(Time(
                    chrono::Utc::now() - chrono::Duration::days(2),
                )),
                ..meta("web-abc123", Some("default"))
            },
            spec: Some(PodSpec {
                node_name: Some("node-1".to_string()),
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                pod_ip: Some("10.244.0.7".to_string()),
                container_statuses: Some(vec![container(2), container(0), container(1)]),
                ..Default::default()
            }),
        };

        let record = pod_record(pod).unwrap();
        assert_eq!(record.restarts, 3);
        assert_eq!(record.node, "node-1");
        assert_eq!(record.ip, "10.244.0.7");
        assert_eq!(record.status, "Running");
        assert_eq!(record.age, "2d");
    }

    #[test]
    fn test_pod_record_unscheduled_pod() {
        let pod = Pod {
            metadata: meta("pending-pod", Some("default")),
            spec: None,
            status: Some(PodStatus {
                phase: Some("Pending".to_string()),
                ..Default::default()
            }),
        };

        let record = pod_record(pod).unwrap();
        assert_eq!(record.node, "");
        assert_eq!(record.ip, "");
        assert_eq!(record.restarts, 0);
        assert_eq!(record.age, "Unknown");
    }

    #[test]
    fn test_pod_record_missing_namespace_is_malformed() {
        let pod = Pod {
            metadata: meta("orphan", None),
            ..Default::default()
        };
        assert!(pod_record(pod).is_err());
    }

    #[test]
    fn test_service_record_ports_and_defaults() {
        let service = Service {
            metadata: meta("web", Some("default")),
            spec: Some(ServiceSpec {
                type_: Some("LoadBalancer".to_string()),
                cluster_ip: Some("10.96.100.50".to_string()),
                ports: Some(vec![
                    ServicePort {
                        port: 80,
                        protocol: Some("TCP".to_string()),
                        ..Default::default()
                    },
                    ServicePort {
                        port: 53,
                        protocol: None,
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let record = service_record(service).unwrap();
        assert_eq!(record.service_type, "LoadBalancer");
        assert_eq!(record.ports.len(), 2);
        assert_eq!(record.ports[0].port, 80);
        assert_eq!(record.ports[1].protocol, "TCP");
        assert_eq!(record.endpoints, 0);
    }

    #[test]
    fn test_deployment_record_defaults_absent_counts() {
        let deployment = Deployment {
            metadata: meta("api", Some("production")),
            ..Default::default()
        };

        let record = deployment_record(deployment).unwrap();
        assert_eq!(record.replicas, 0);
        assert_eq!(record.ready_replicas, 0);
        assert_eq!(record.available_replicas, 0);
        assert_eq!(record.age, "Unknown");
    }

    #[test]
    fn test_mapping_failure_fails_whole_collection() {
        let pods = vec![
            Pod {
                metadata: meta("ok-pod", Some("default")),
                ..Default::default()
            },
            // No name: normalization must fail the entire batch
            Pod::default(),
        ];

        let result: CollectResult<PodRecord> = pods.into_iter().map(pod_record).collect();
        assert!(result.is_err());
    }
}
