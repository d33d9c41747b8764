//! Cluster state collection from the Kubernetes control plane
//!
//! The collector talks to an externally-controlled API server that may be
//! slow, unreachable, or serving malformed objects. Its contract is to
//! convert every one of those failure modes into a typed result: a call
//! returns either the full normalized record list or a `ClusterError`,
//! never a partial list and never a panic.

mod client;
mod collector;
mod mock;

pub use client::ClusterClient;
pub use collector::Collector;
pub use mock::StaticClusterData;

use crate::models::{
    DeploymentRecord, ErrorSentinel, NamespaceRecord, NodeRecord, PodRecord, ServiceRecord,
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by cluster collection
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Both credential sources failed; carries the cause from each attempt
    #[error("cannot connect to control plane: kubeconfig: {kubeconfig}; in-cluster: {in_cluster}")]
    SessionUnavailable {
        kubeconfig: String,
        in_cluster: String,
    },

    #[error("control plane request failed: {0}")]
    Api(#[from] kube::Error),

    /// A returned object is missing fields required for normalization
    #[error("malformed {kind} object: {detail}")]
    Malformed { kind: &'static str, detail: String },
}

impl ClusterError {
    /// Render the error as the single-element sentinel sequence that stands
    /// in for "this call failed" on the wire.
    pub fn sentinel(&self) -> Vec<ErrorSentinel> {
        vec![ErrorSentinel::new(self.to_string())]
    }
}

/// Result of one collection call: all records or nothing.
pub type CollectResult<T> = Result<Vec<T>, ClusterError>;

/// Capability interface over cluster state, one method per resource kind.
///
/// Two implementations exist: the live [`Collector`] backed by the control
/// plane, and [`StaticClusterData`] serving fixture records. Which one a
/// response is built from is the caller's decision, not this trait's.
#[async_trait]
pub trait ClusterMetricsSource: Send + Sync {
    async fn get_nodes(&self) -> CollectResult<NodeRecord>;

    /// Pods, optionally restricted to one namespace.
    async fn get_pods(&self, namespace: Option<&str>) -> CollectResult<PodRecord>;

    /// Services, optionally restricted to one namespace.
    async fn get_services(&self, namespace: Option<&str>) -> CollectResult<ServiceRecord>;

    async fn get_namespaces(&self) -> CollectResult<NamespaceRecord>;

    /// Deployments, optionally restricted to one namespace.
    async fn get_deployments(&self, namespace: Option<&str>) -> CollectResult<DeploymentRecord>;
}
