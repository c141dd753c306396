//! # REST API
//!
//! Builds the axum router that exposes the registry over HTTP. All handlers
//! share [`AppState`] through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                      | Description                        |
//! |--------|---------------------------|------------------------------------|
//! | GET    | `/health`                 | Liveness probe                     |
//! | GET    | `/height`                 | Ledger height                      |
//! | POST   | `/challenge`              | Issue a challenge for an address   |
//! | POST   | `/stars`                  | Submit a signed star claim         |
//! | GET    | `/blocks/height/:height`  | Block by height                    |
//! | GET    | `/blocks/hash/:hash`      | Block by hash                      |
//! | GET    | `/stars/:address`         | Stars owned by an address          |
//! | GET    | `/chain/validate`         | Full-ledger validation report      |
//!
//! Errors come back as `{ "error": "...", "reason": "..." }` with a status
//! derived from the [`RegistryError`] variant.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use star_registry::registry::{OwnedStar, RegistryError, StarRegistry};
use star_registry::storage::{Block, ChainBlock, Star, ValidationReport};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Node software version, reported by `/health`.
    pub version: String,
    pub registry: Arc<StarRegistry>,
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/height", get(height_handler))
        .route("/challenge", post(challenge_handler))
        .route("/stars", post(submit_star_handler))
        .route("/blocks/height/:height", get(block_by_height_handler))
        .route("/blocks/hash/:hash", get(block_by_hash_handler))
        .route("/stars/:address", get(stars_by_owner_handler))
        .route("/chain/validate", get(validate_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct HeightResponse {
    pub height: u64,
}

/// Body of `POST /challenge`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeRequest {
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// The exact string to sign.
    pub message: String,
}

/// Body of `POST /stars`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitStarRequest {
    pub address: String,
    pub message: String,
    /// Hex-encoded Ed25519 signature over `message`.
    pub signature: String,
    pub star: Star,
}

/// Error body for all non-2xx responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Error Mapping
// ---------------------------------------------------------------------------

/// [`RegistryError`] rendered as an HTTP response.
pub struct ApiError(pub RegistryError);

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        ApiError(err)
    }
}

/// HTTP status for each registry error.
pub fn status_for(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::NotFound(_) | RegistryError::NoResults(_) => StatusCode::NOT_FOUND,
        RegistryError::ChallengeExpired { .. } | RegistryError::InvalidSignature { .. } => {
            StatusCode::UNAUTHORIZED
        }
        RegistryError::MalformedSignature { .. } | RegistryError::MalformedChallenge { .. } => {
            StatusCode::BAD_REQUEST
        }
        RegistryError::ChainIntegrityViolation(_) => StatusCode::CONFLICT,
        RegistryError::Codec(_) | RegistryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            reason: self.0.reason().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the node is alive.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /height`: current ledger height.
async fn height_handler(State(state): State<AppState>) -> Json<HeightResponse> {
    Json(HeightResponse {
        height: state.registry.chain_height(),
    })
}

/// `POST /challenge`: issue a challenge for the given address.
///
/// The address is not checked here; a bad one fails at submission.
async fn challenge_handler(
    State(state): State<AppState>,
    Json(req): Json<ChallengeRequest>,
) -> Json<ChallengeResponse> {
    Json(ChallengeResponse {
        message: state.registry.request_challenge(&req.address),
    })
}

/// `POST /stars`: verify a signed challenge and append the star.
async fn submit_star_handler(
    State(state): State<AppState>,
    Json(req): Json<SubmitStarRequest>,
) -> ApiResult<(StatusCode, Json<Block>)> {
    let started = Instant::now();
    let result = state
        .registry
        .submit_star(&req.address, &req.message, &req.signature, req.star)
        .await;

    match result {
        Ok(block) => {
            state
                .metrics
                .record_append(block.height(), started.elapsed());
            Ok((StatusCode::CREATED, Json(block)))
        }
        Err(e) => {
            state.metrics.record_rejection(&e);
            Err(e.into())
        }
    }
}

/// `GET /blocks/height/:height`
async fn block_by_height_handler(
    Path(height): Path<u64>,
    State(state): State<AppState>,
) -> ApiResult<Json<Block>> {
    Ok(Json(state.registry.block_by_height(height)?))
}

/// `GET /blocks/hash/:hash`
async fn block_by_hash_handler(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Block>> {
    Ok(Json(state.registry.block_by_hash(&hash)?))
}

/// `GET /stars/:address`: every star owned by `address`, oldest first.
async fn stars_by_owner_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<OwnedStar>>> {
    Ok(Json(state.registry.stars_by_owner(&address).await?))
}

/// `GET /chain/validate`: always 200; the body says whether it is valid.
async fn validate_handler(State(state): State<AppState>) -> Json<ValidationReport> {
    Json(state.registry.validate_chain())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
