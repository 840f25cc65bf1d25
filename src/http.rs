//! HTTP surface — thin axum layer over the orchestrator.
//!
//! One chat endpoint plus read-only session listing and a health probe.
//! Every response uses the same envelope; only a gateway with no usable
//! provider at all surfaces as a 5xx.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::error::Error;
use crate::llm::TaskHint;
use crate::orchestrator::{ChatTurn, Orchestrator};
use crate::store::Database;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub db: Arc<dyn Database>,
}

/// Uniform response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub http_code: u16,
    pub payload: Option<T>,
}

fn envelope<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    payload: Option<T>,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        status,
        Json(ApiResponse {
            success: status.is_success(),
            message: message.into(),
            http_code: status.as_u16(),
            payload,
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatPayload {
    pub response: String,
    pub agent: String,
    pub session_id: String,
}

/// Build the application router.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/{id}", get(get_session))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> impl IntoResponse {
    // Missing session ids are minted here and handed back for continuity.
    let session_id = req
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let task_hint = req
        .task_type
        .as_deref()
        .map(TaskHint::parse)
        .unwrap_or_default();

    match state
        .orchestrator
        .handle_message(ChatTurn {
            message: req.message,
            session_id: session_id.clone(),
            task_hint,
        })
        .await
    {
        Ok(reply) => envelope(
            StatusCode::OK,
            "Chat completed successfully",
            Some(ChatPayload {
                response: reply.output,
                agent: reply.agent,
                session_id,
            }),
        ),
        Err(Error::Llm(e)) => envelope(StatusCode::SERVICE_UNAVAILABLE, e.to_string(), None),
        Err(e) => envelope(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
    }
}

async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.list_sessions().await {
        Ok(sessions) => envelope(
            StatusCode::OK,
            "Sessions list retrieved successfully",
            Some(sessions),
        ),
        Err(e) => envelope(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
    }
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.db.load_session(&id).await {
        Ok(Some(session)) => envelope(StatusCode::OK, "Session retrieved", Some(session)),
        Ok(None) => envelope(StatusCode::NOT_FOUND, "Session not found", None),
        Err(e) => envelope(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
    }
}
