//! Cluster resource CLI commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{parse_records, ApiClient};
use crate::output::{color_status, format_bytes, print_json, print_table, OutputFormat};
use clusterpulse_lib::models::{
    DeploymentRecord, NamespaceRecord, NodeRecord, PodRecord, ServiceRecord,
};

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "CPU")]
    cpu: u32,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Alloc CPU")]
    alloc_cpu: u32,
    #[tabled(rename = "Alloc Memory")]
    alloc_memory: String,
}

#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Restarts")]
    restarts: i32,
    #[tabled(rename = "Age")]
    age: String,
}

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Type")]
    service_type: String,
    #[tabled(rename = "Cluster IP")]
    cluster_ip: String,
    #[tabled(rename = "Ports")]
    ports: String,
    #[tabled(rename = "Endpoints")]
    endpoints: usize,
}

#[derive(Tabled)]
struct NamespaceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct DeploymentRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Available")]
    available: i32,
    #[tabled(rename = "Age")]
    age: String,
}

fn with_namespace(path: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("{path}?namespace={ns}"),
        None => path.to_string(),
    }
}

/// Show cluster nodes
pub async fn show_nodes(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let value: serde_json::Value = client.get("api/v1/cluster/nodes").await?;
    let nodes: Vec<NodeRecord> = parse_records(value)?;

    match format {
        OutputFormat::Json => print_json(&nodes)?,
        OutputFormat::Table => {
            let rows: Vec<NodeRow> = nodes
                .iter()
                .map(|n| NodeRow {
                    name: n.name.clone(),
                    status: color_status(&n.status),
                    cpu: n.cpu_cores,
                    memory: format_bytes(n.memory_bytes),
                    alloc_cpu: n.allocatable.cpu_cores,
                    alloc_memory: format_bytes(n.allocatable.memory_bytes),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

/// Show pods, optionally filtered to one namespace
pub async fn show_pods(
    client: &ApiClient,
    namespace: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let path = with_namespace("api/v1/cluster/pods", namespace);
    let value: serde_json::Value = client.get(&path).await?;
    let pods: Vec<PodRecord> = parse_records(value)?;

    match format {
        OutputFormat::Json => print_json(&pods)?,
        OutputFormat::Table => {
            let rows: Vec<PodRow> = pods
                .iter()
                .map(|p| PodRow {
                    name: p.name.clone(),
                    namespace: p.namespace.clone(),
                    status: color_status(&p.status),
                    node: p.node.clone(),
                    ip: p.ip.clone(),
                    restarts: p.restarts,
                    age: p.age.clone(),
                })
                .collect();
            print_table(&rows);
            println!("\nTotal: {} pods", pods.len());
        }
    }

    Ok(())
}

/// Show services, optionally filtered to one namespace
pub async fn show_services(
    client: &ApiClient,
    namespace: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let path = with_namespace("api/v1/cluster/services", namespace);
    let value: serde_json::Value = client.get(&path).await?;
    let services: Vec<ServiceRecord> = parse_records(value)?;

    match format {
        OutputFormat::Json => print_json(&services)?,
        OutputFormat::Table => {
            let rows: Vec<ServiceRow> = services
                .iter()
                .map(|s| ServiceRow {
                    name: s.name.clone(),
                    namespace: s.namespace.clone(),
                    service_type: s.service_type.clone(),
                    cluster_ip: s.cluster_ip.clone(),
                    ports: s
                        .ports
                        .iter()
                        .map(|p| format!("{}/{}", p.port, p.protocol))
                        .collect::<Vec<_>>()
                        .join(","),
                    endpoints: s.endpoints,
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

/// Show namespaces
pub async fn show_namespaces(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let value: serde_json::Value = client.get("api/v1/cluster/namespaces").await?;
    let namespaces: Vec<NamespaceRecord> = parse_records(value)?;

    match format {
        OutputFormat::Json => print_json(&namespaces)?,
        OutputFormat::Table => {
            let rows: Vec<NamespaceRow> = namespaces
                .iter()
                .map(|n| NamespaceRow {
                    name: n.name.clone(),
                    status: color_status(&n.status),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

/// Show deployments, optionally filtered to one namespace
pub async fn show_deployments(
    client: &ApiClient,
    namespace: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let path = with_namespace("api/v1/cluster/deployments", namespace);
    let value: serde_json::Value = client.get(&path).await?;
    let deployments: Vec<DeploymentRecord> = parse_records(value)?;

    match format {
        OutputFormat::Json => print_json(&deployments)?,
        OutputFormat::Table => {
            let rows: Vec<DeploymentRow> = deployments
                .iter()
                .map(|d| DeploymentRow {
                    name: d.name.clone(),
                    namespace: d.namespace.clone(),
                    ready: format!("{}/{}", d.ready_replicas, d.replicas),
                    available: d.available_replicas,
                    age: d.age.clone(),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

/// Show the aggregated cluster overview
pub async fn show_overview(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let overview: serde_json::Value = client.get("api/v1/cluster/overview").await?;

    match format {
        OutputFormat::Json => print_json(&overview)?,
        OutputFormat::Table => {
            println!("{}", "Cluster Overview".bold());
            println!("{}", "=".repeat(40));
            println!("Nodes:       {}", overview["cluster"]["nodes"]);
            println!("Pods:        {}", overview["cluster"]["pods"]);
            println!("Services:    {}", overview["cluster"]["services"]);
            println!("Namespaces:  {}", overview["cluster"]["namespaces"]);
            println!();
            println!("{}", "Resources".bold());
            println!("{}", "-".repeat(40));
            println!("CPU cores:   {}", overview["resources"]["cpu_cores"]);
            println!("Memory (GB): {}", overview["resources"]["memory_gb"]);
            println!();
            println!("{}", "Pod phases".bold());
            println!("{}", "-".repeat(40));
            println!("Running:     {}", overview["pods"]["running"]);
            println!("Pending:     {}", overview["pods"]["pending"]);
            println!("Other:       {}", overview["pods"]["other"]);
        }
    }

    Ok(())
}
