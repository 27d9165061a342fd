//! HTTP API for the RLM service
//!
//! Endpoints mirror what the frontend consumes:
//! - `GET /api/health` - liveness probe
//! - `GET /api/get-dataset?index=N` - fetch one benchmark example
//! - `POST /api/query {index}` - run (or replay) the loop for one example
//! - `GET /metrics` - Prometheus text exposition

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::{RlmController, RlmError, RunConfig, TranscriptEntry};
use crate::config::ServerConfig;
use crate::llm::OpenAiChatClient;
use crate::metrics::{self, API_REQUESTS};
use crate::repl::RemoteReplSession;

pub mod dataset;

pub use dataset::{CachedAnswer, DatasetError, DatasetExample, DatasetStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub dataset: Arc<DatasetStore>,
    pub controller: Arc<RlmController<OpenAiChatClient>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let model = OpenAiChatClient::new(
            config.llm_base_url.clone(),
            config.llm_api_key.clone(),
            config.model_name.clone(),
        );
        let controller = RlmController::new(
            model,
            RunConfig {
                max_iterations: config.max_iterations,
                system_prompt: None,
            },
        );
        let dataset = DatasetStore::new(&config);

        Self {
            config: Arc::new(config),
            dataset: Arc::new(dataset),
            controller: Arc::new(controller),
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/get-dataset", get(get_dataset))
        .route("/api/query", post(query))
        .route("/metrics", get(metrics_text))
        .with_state(state)
}

/// Error response shape for all handlers
struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<DatasetError> for ApiError {
    fn from(e: DatasetError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: e.to_string(),
        }
    }
}

impl From<RlmError> for ApiError {
    fn from(e: RlmError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: e.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct DatasetParams {
    index: usize,
}

#[derive(Serialize)]
struct DatasetResponse {
    context: String,
    query: String,
}

#[derive(Deserialize)]
struct QueryRequest {
    index: usize,
}

#[derive(Serialize)]
struct QueryResponse {
    final_answer: Option<String>,
    messages: Vec<TranscriptEntry>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_dataset(
    State(state): State<AppState>,
    Query(params): Query<DatasetParams>,
) -> Result<Json<DatasetResponse>, ApiError> {
    let start = Instant::now();
    let index = params.index % state.config.cutoff_index;

    let example = state.dataset.example(index).await?;

    API_REQUESTS
        .with_label_values(&["get-dataset"])
        .observe(start.elapsed().as_secs_f64());

    Ok(Json(DatasetResponse {
        context: example.context_window_text,
        query: example.question,
    }))
}

async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let start = Instant::now();
    let index = request.index % state.config.cutoff_index;

    if let Some(cached) = state.dataset.cached_answer(index) {
        info!(index, "Query served from answer cache");
        return Ok(Json(QueryResponse {
            final_answer: cached.final_answer,
            messages: cached.code_and_output,
        }));
    }

    let example = state.dataset.example(index).await?;

    let session = RemoteReplSession::new(state.config.repl_env_url.clone());
    let outcome = state
        .controller
        .run(
            session,
            &example.context_window_text,
            &example.question,
            state.config.hf_token.as_deref(),
        )
        .await?;

    let answer = CachedAnswer {
        final_answer: outcome.final_answer,
        code_and_output: outcome.transcript,
    };

    // A failed cache write is not worth failing the request over
    if let Err(e) = state.dataset.store_answer(index, &answer) {
        warn!(index, error = %e, "Failed to cache answer");
    }

    API_REQUESTS
        .with_label_values(&["query"])
        .observe(start.elapsed().as_secs_f64());

    info!(
        index,
        iterations = outcome.iterations,
        executions = outcome.executions,
        answered = answer.final_answer.is_some(),
        trace_id = %outcome.trace_id,
        "Query completed"
    );

    Ok(Json(QueryResponse {
        final_answer: answer.final_answer,
        messages: answer.code_and_output,
    }))
}

async fn metrics_text() -> String {
    metrics::render()
}
