//! HTTP API for the completion registry
//!
//! Endpoints:
//! - POST /api/login - Validate a credential (200 / 400 / 404 / 409 / 500)
//! - POST /api/complete - Record a completion, idempotent (200 / 400 / 500)
//! - GET /health - Health check

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::service::local::{check_uid, record_uid};
use crate::service::store::{MarkOutcome, UidStore};

/// App state
pub struct AppState {
    pub store: Arc<dyn UidStore>,
}

/// Request body of both POST endpoints
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UidRequest {
    #[serde(default)]
    pub uid: Option<String>,
}

/// Response body of both POST endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub completions: usize,
}

type ApiReply = (StatusCode, Json<ApiResponse>);

fn reply(status: StatusCode, message: &str) -> ApiReply {
    (
        status,
        Json(ApiResponse { success: status.is_success(), message: message.to_string() }),
    )
}

/// Create the API router
pub fn create_router(store: Arc<dyn UidStore>) -> Router {
    let state = Arc::new(AppState { store });

    Router::new()
        .route("/health", get(health))
        .route("/api/login", post(login))
        .route("/api/complete", post(complete))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, StatusCode> {
    let completions = state
        .store
        .completion_count()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        completions,
    }))
}

/// A missing, empty or unparsable body all count as "no uid"
fn requested_uid(body: Result<Json<UidRequest>, JsonRejection>) -> Option<String> {
    match body {
        Ok(Json(req)) => req.uid.filter(|uid| !uid.trim().is_empty()),
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable request body");
            None
        }
    }
}

/// Validate a credential at login
async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UidRequest>, JsonRejection>,
) -> ApiReply {
    let Some(uid) = requested_uid(body) else {
        return reply(StatusCode::BAD_REQUEST, "UID is required.");
    };

    match check_uid(state.store.as_ref(), &uid) {
        Ok(()) => reply(StatusCode::OK, "UID is valid."),
        Err(RegistryError::NotFound) => reply(StatusCode::NOT_FOUND, "Invalid UID."),
        Err(RegistryError::AlreadyUsed) => {
            reply(StatusCode::CONFLICT, "This UID has already been used.")
        }
        Err(RegistryError::MissingUid) => reply(StatusCode::BAD_REQUEST, "UID is required."),
        Err(RegistryError::Server(_)) => reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            "A storage error occurred during login.",
        ),
    }
}

/// Record a credential once the attempt is finished or terminated
async fn complete(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UidRequest>, JsonRejection>,
) -> ApiReply {
    let Some(uid) = requested_uid(body) else {
        return reply(StatusCode::BAD_REQUEST, "UID is required.");
    };

    match record_uid(state.store.as_ref(), &uid) {
        Ok(outcome) => {
            if outcome == MarkOutcome::Inserted {
                info!(uid = %uid, "Completion recorded");
            } else {
                debug!(uid = %uid, "Completion already recorded");
            }
            reply(StatusCode::OK, "UID has been successfully recorded.")
        }
        Err(RegistryError::MissingUid) => reply(StatusCode::BAD_REQUEST, "UID is required."),
        Err(_) => reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            "A storage error occurred during completion.",
        ),
    }
}

/// Run the API server
pub async fn run_server(addr: &str, store: Arc<dyn UidStore>) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(store);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Completion registry listening");
    info!("  POST /api/login     - Validate credential");
    info!("  POST /api/complete  - Record completion");
    info!("  GET  /health        - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
