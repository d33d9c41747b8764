//! Agent library for the ClusterPulse operations agent
//!
//! This crate provides the core functionality for:
//! - Cluster state collection from the Kubernetes control plane
//! - Static fixture data for degraded operation
//! - Script execution with timeout enforcement
//! - Health checks and observability

pub mod cluster;
pub mod health;
pub mod models;
pub mod observability;
pub mod quantity;
pub mod runner;

pub use cluster::{
    ClusterClient, ClusterError, ClusterMetricsSource, CollectResult, Collector, StaticClusterData,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AgentMetrics, StructuredLogger};
pub use runner::TaskRunner;
