use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::memory::{MemoryEntry, MemoryStore, Note};
use crate::plan::{Plan, Step};
use crate::planner::{PlanAdapter, PlanError, PlanOptions};

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self { port }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.port))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<PlanAdapter>,
    pub memory: Arc<MemoryStore>,
    pub shutdown: CancellationToken,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub task: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResponse {
    pub plan: Plan,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub steps: Vec<Step>,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub result: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemoryResponse {
    pub memory: Vec<MemoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/agent/plan", post(plan))
        .route("/api/agent/execute", post(execute))
        .route("/api/agent/memory", get(memory))
        .route("/chat", post(chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind, serve until Ctrl-C, then drain.
pub async fn serve(
    config: ServerConfig,
    adapter: PlanAdapter,
    memory: MemoryStore,
) -> anyhow::Result<()> {
    memory
        .ensure_initialized()
        .await
        .context("failed to initialize memory store")?;

    let shutdown = CancellationToken::new();
    let state = AppState {
        adapter: Arc::new(adapter),
        memory: Arc::new(memory),
        shutdown: shutdown.clone(),
    };

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("failed to bind {}", config.addr()))?;

    if !state.adapter.has_backend() {
        log::warn!("LLM_API_URL not set; plans will use the fallback generator");
    }
    println!("agentverse listening on http://{}", config.addr());

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("shutdown requested");
            signal.cancel();
        }
    });

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("server terminated with error")
}

async fn health() -> &'static str {
    "Agentverse backend is running"
}

async fn plan(
    State(state): State<AppState>,
    Json(payload): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    let plan = plan_for(&state, &payload.task).await?;
    Ok(Json(PlanResponse { plan }))
}

async fn execute(
    State(state): State<AppState>,
    Json(payload): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let result = state
        .adapter
        .summarize_execution(&payload.steps, &payload.context)
        .await
        .map_err(|error| {
            log::error!("/execute backend error: {error}");
            api_error(StatusCode::BAD_GATEWAY, error.to_string())
        })?;

    state
        .memory
        .append(Note::execution(result.clone()))
        .await
        .map_err(|error| {
            log::error!("/execute memory error: {error}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        })?;

    Ok(Json(ExecuteResponse { result }))
}

async fn memory(State(state): State<AppState>) -> Result<Json<MemoryResponse>, ApiError> {
    let notes = state.memory.notes().await.map_err(|error| {
        log::error!("/memory error: {error}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    })?;

    Ok(Json(MemoryResponse { memory: notes }))
}

async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let plan = plan_for(&state, &payload.message).await?;
    Ok(Json(ChatResponse {
        reply: plan.to_numbered_list(),
    }))
}

async fn plan_for(state: &AppState, task: &str) -> Result<Plan, ApiError> {
    if task.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "task must not be empty"));
    }

    let cancel = state.shutdown.child_token();
    state
        .adapter
        .generate_plan_cancellable(task, &PlanOptions::default(), &cancel)
        .await
        .map_err(|error| match error {
            PlanError::Cancelled => api_error(StatusCode::SERVICE_UNAVAILABLE, error.to_string()),
        })
}
