//! HTTP API server with WebSocket support

use super::ws::ws_handler;
use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::error::{DashError, Result};
use crate::metrics::MetricsSnapshot;
use crate::registry::{AgentPayload, AgentRecord};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// API server state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    /// Outbound buffer per WebSocket client
    pub client_buffer: usize,
}

/// Build router
pub fn router(state: AppState) -> Router {
    Router::new()
        // Live updates
        .route("/ws", get(ws_handler))
        // Agent registry
        .route("/agents", get(list_agents_handler).post(register_agent_handler))
        .route("/agents/:id", delete(remove_agent_handler))
        // Metrics
        .route("/metrics", get(metrics_handler))
        // Health check
        .route("/health", get(health_handler))
        .with_state(state)
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    config: ServerConfig,
    engine: Arc<Engine>,
}

impl ApiServer {
    pub fn new(config: ServerConfig, engine: Arc<Engine>) -> Self {
        Self { config, engine }
    }

    /// Serve until `shutdown` resolves
    ///
    /// Failing to bind is returned to the caller; the engine itself does not
    /// depend on the listener.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let state = AppState {
            engine: self.engine.clone(),
            client_buffer: self.config.client_buffer,
        };

        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .map_err(|source| DashError::Bind {
                addr: self.config.addr,
                source,
            })?;

        info!("API server listening on http://{}", self.config.addr);
        info!("Dashboard WebSocket: ws://{}/ws", self.config.addr);

        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

/// Register agent request
#[derive(Debug, Deserialize)]
pub struct RegisterAgentRequest {
    pub id: String,
    #[serde(default)]
    pub payload: AgentPayload,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Register or update agent handler
async fn register_agent_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterAgentRequest>,
) -> std::result::Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    if req.id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "agent id must not be empty".to_string(),
            }),
        ));
    }

    state
        .engine
        .register_or_update_agent(req.id, req.payload)
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// List agents handler
async fn list_agents_handler(State(state): State<AppState>) -> Json<HashMap<String, AgentRecord>> {
    Json(state.engine.agents().await)
}

/// Remove agent handler (idempotent)
async fn remove_agent_handler(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.engine.remove_agent(&id).await;
    StatusCode::NO_CONTENT
}

/// Metrics handler
async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.engine.get_metrics_snapshot().await)
}

/// Health check handler
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    agents: usize,
    subscribers: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let metrics = state.engine.get_metrics_snapshot().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        agents: metrics.agent_count,
        subscribers: metrics.subscriber_count,
    })
}
