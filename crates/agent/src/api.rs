//! HTTP API over the collector and task runner
//!
//! The cluster routes own the fallback decision the collector deliberately
//! does not make: on a failed (or empty) collection they substitute fixture
//! data when `mock_fallback` is enabled, and return the error sentinel
//! verbatim when it is not.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clusterpulse_lib::{
    cluster::{ClusterMetricsSource, CollectResult},
    health::{components, ComponentStatus, HealthRegistry},
    models::{ClusterOverview, RunningTask, TaskStatus},
    observability::{AgentMetrics, StructuredLogger},
    runner::{TaskRunner, TIMEOUT_EXIT_CODE},
    ClusterError, StaticClusterData,
};
use dashmap::DashMap;
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Shared application state: explicit handles, constructed once in main
pub struct AppState {
    live: Arc<dyn ClusterMetricsSource>,
    fixture: StaticClusterData,
    runner: TaskRunner,
    running: DashMap<u64, RunningTask>,
    next_task_id: AtomicU64,
    pub health_registry: HealthRegistry,
    pub metrics: AgentMetrics,
    pub logger: StructuredLogger,
    mock_fallback: bool,
    default_task_timeout: Duration,
}

impl AppState {
    pub fn new(
        live: Arc<dyn ClusterMetricsSource>,
        health_registry: HealthRegistry,
        metrics: AgentMetrics,
        logger: StructuredLogger,
        mock_fallback: bool,
        default_task_timeout: Duration,
    ) -> Self {
        Self {
            live,
            fixture: StaticClusterData::new(),
            runner: TaskRunner::new(),
            running: DashMap::new(),
            next_task_id: AtomicU64::new(1),
            health_registry,
            metrics,
            logger,
            mock_fallback,
            default_task_timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NamespaceQuery {
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PodQuery {
    pub namespace: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RunScriptRequest {
    pub script: String,
    #[serde(default = "default_script_type")]
    pub script_type: String,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_script_type() -> String {
    "bash".to_string()
}

/// Health check - 200 while at least degraded, 503 when unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check - 200 if ready, 503 if not
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Render one collection result, applying the fallback policy.
async fn respond<T: Serialize>(
    state: &AppState,
    resource: &'static str,
    result: CollectResult<T>,
    fixture: Vec<T>,
) -> Response {
    match result {
        Ok(records) if !records.is_empty() => {
            state
                .health_registry
                .set_healthy(components::CONTROL_PLANE)
                .await;
            Json(records).into_response()
        }
        Ok(_) => {
            state
                .health_registry
                .set_healthy(components::CONTROL_PLANE)
                .await;
            if state.mock_fallback {
                state.metrics.inc_mock_fallbacks();
                Json(fixture).into_response()
            } else {
                Json(Vec::<T>::new()).into_response()
            }
        }
        Err(err) => degrade(state, resource, err, fixture).await,
    }
}

async fn degrade<T: Serialize>(
    state: &AppState,
    resource: &'static str,
    err: ClusterError,
    fixture: Vec<T>,
) -> Response {
    state.metrics.inc_collection_errors();
    state
        .logger
        .log_collection_fallback(resource, &err.to_string());
    state
        .health_registry
        .set_degraded(components::CONTROL_PLANE, err.to_string())
        .await;

    if state.mock_fallback {
        state.metrics.inc_mock_fallbacks();
        Json(fixture).into_response()
    } else {
        Json(err.sentinel()).into_response()
    }
}

async fn get_nodes(State(state): State<Arc<AppState>>) -> Response {
    let started = Instant::now();
    let result = state.live.get_nodes().await;
    state
        .metrics
        .observe_collection_latency("nodes", started.elapsed().as_secs_f64());
    respond(&state, "nodes", result, state.fixture.nodes()).await
}

async fn get_pods(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PodQuery>,
) -> Response {
    let started = Instant::now();
    let result = state.live.get_pods(query.namespace.as_deref()).await;
    state
        .metrics
        .observe_collection_latency("pods", started.elapsed().as_secs_f64());

    let limit = query.limit.unwrap_or(100);
    let result = result.map(|mut pods| {
        pods.truncate(limit);
        pods
    });
    let mut fixture = state.fixture.pods();
    fixture.truncate(limit);

    respond(&state, "pods", result, fixture).await
}

async fn get_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NamespaceQuery>,
) -> Response {
    let started = Instant::now();
    let result = state.live.get_services(query.namespace.as_deref()).await;
    state
        .metrics
        .observe_collection_latency("services", started.elapsed().as_secs_f64());
    respond(&state, "services", result, state.fixture.services()).await
}

async fn get_namespaces(State(state): State<Arc<AppState>>) -> Response {
    let started = Instant::now();
    let result = state.live.get_namespaces().await;
    state
        .metrics
        .observe_collection_latency("namespaces", started.elapsed().as_secs_f64());
    respond(&state, "namespaces", result, state.fixture.namespaces()).await
}

async fn get_deployments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NamespaceQuery>,
) -> Response {
    let started = Instant::now();
    let result = state.live.get_deployments(query.namespace.as_deref()).await;
    state
        .metrics
        .observe_collection_latency("deployments", started.elapsed().as_secs_f64());
    respond(&state, "deployments", result, state.fixture.deployments()).await
}

async fn get_overview(State(state): State<Arc<AppState>>) -> Response {
    let started = Instant::now();
    let result = live_overview(state.live.as_ref()).await;
    state
        .metrics
        .observe_collection_latency("overview", started.elapsed().as_secs_f64());

    match result {
        Ok(overview) if overview.cluster.nodes > 0 => {
            state
                .health_registry
                .set_healthy(components::CONTROL_PLANE)
                .await;
            Json(overview).into_response()
        }
        Ok(overview) => {
            if state.mock_fallback {
                state.metrics.inc_mock_fallbacks();
                Json(state.fixture.overview()).into_response()
            } else {
                Json(overview).into_response()
            }
        }
        Err(err) => {
            let fallback = state.fixture.overview();
            state.metrics.inc_collection_errors();
            state
                .logger
                .log_collection_fallback("overview", &err.to_string());
            state
                .health_registry
                .set_degraded(components::CONTROL_PLANE, err.to_string())
                .await;
            if state.mock_fallback {
                state.metrics.inc_mock_fallbacks();
                Json(fallback).into_response()
            } else {
                Json(err.sentinel()).into_response()
            }
        }
    }
}

async fn live_overview(
    source: &dyn ClusterMetricsSource,
) -> Result<ClusterOverview, ClusterError> {
    let nodes = source.get_nodes().await?;
    let pods = source.get_pods(None).await?;
    let services = source.get_services(None).await?;
    let namespaces = source.get_namespaces().await?;
    Ok(ClusterOverview::from_records(
        &nodes,
        &pods,
        &services,
        &namespaces,
    ))
}

async fn run_task(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunScriptRequest>,
) -> Response {
    let timeout_secs = request
        .timeout_seconds
        .unwrap_or(state.default_task_timeout.as_secs());
    if timeout_secs == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "timeout_seconds must be positive"})),
        )
            .into_response();
    }

    let id = state.next_task_id.fetch_add(1, Ordering::Relaxed);
    state.running.insert(
        id,
        RunningTask {
            id,
            script_type: request.script_type.clone(),
            started_at: chrono::Utc::now().timestamp(),
        },
    );
    state.metrics.set_tasks_running(state.running.len() as i64);

    let result = state
        .runner
        .run_script(
            &request.script,
            &request.script_type,
            Duration::from_secs(timeout_secs),
            &request.env,
        )
        .await;

    state.running.remove(&id);
    state.metrics.set_tasks_running(state.running.len() as i64);

    state.metrics.inc_task_runs();
    if result.status == TaskStatus::Failed {
        state.metrics.inc_task_failures();
        if result.exit_code == TIMEOUT_EXIT_CODE {
            state.metrics.inc_task_timeouts();
        }
    }
    state.metrics.observe_task_duration(result.duration_seconds);
    state.logger.log_task_completed(
        &request.script_type,
        if result.status == TaskStatus::Success {
            "success"
        } else {
            "failed"
        },
        result.exit_code,
        result.duration_seconds,
    );

    Json(result).into_response()
}

async fn running_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<RunningTask>> {
    let mut tasks: Vec<RunningTask> = state
        .running
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    tasks.sort_by_key(|t| t.id);
    Json(tasks)
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/cluster/nodes", get(get_nodes))
        .route("/api/v1/cluster/pods", get(get_pods))
        .route("/api/v1/cluster/services", get(get_services))
        .route("/api/v1/cluster/namespaces", get(get_namespaces))
        .route("/api/v1/cluster/deployments", get(get_deployments))
        .route("/api/v1/cluster/overview", get(get_overview))
        .route("/api/v1/tasks/run", post(run_task))
        .route("/api/v1/tasks/running", get(running_tasks))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
