//! HTTP contract for submitting commands and probing liveness.
//!
//! Every response carries permissive CORS headers so browser-hosted signal
//! sources can call the service directly. `OPTIONS` on any path is answered
//! by the CORS layer with an empty 200.

use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::core::{BridgeError, CommandRecord};
use crate::queue::CommandQueue;

pub const SERVER_NAME: &str = "Unity BCI Server";
pub const STATUS_BODY: &str = "Unity BCI Server Running";
pub const PING_BODY: &str = "pong";
pub const QUEUED_BODY: &str = "Command queued";
pub const NOT_FOUND_BODY: &str = "404 - Not Found";

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

/// Shared handler state. Holds only the producer end of the queue.
#[derive(Clone, Debug)]
pub struct ServerState {
    queue: CommandQueue,
    port: u16,
    request_timeout: Option<Duration>,
}

impl ServerState {
    pub fn new(queue: CommandQueue, port: u16) -> Self {
        Self {
            queue,
            port,
            request_timeout: None,
        }
    }

    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::InvalidCommand(message) => Self::BadRequest(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Field order matters to clients that compare the raw body.
#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    server: &'static str,
    port: u16,
}

pub fn build_router(state: ServerState) -> Router {
    let mut router = Router::new()
        .route("/status", get(status).fallback(not_found))
        .route("/ping", get(ping).fallback(not_found))
        .route("/health", get(health).fallback(not_found))
        .route("/command", post(queue_command).fallback(not_found))
        .fallback(not_found);

    if let Some(timeout) = state.request_timeout {
        router = router.layer(TimeoutLayer::new(timeout));
    }

    router
        .layer(middleware::map_response(stamp_cors_headers))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers([header::CONTENT_TYPE])
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn status() -> &'static str {
    STATUS_BODY
}

async fn ping() -> &'static str {
    PING_BODY
}

async fn health(State(state): State<ServerState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        server: SERVER_NAME,
        port: state.port,
    })
}

async fn queue_command(State(state): State<ServerState>, body: Bytes) -> ApiResult<&'static str> {
    let record = CommandRecord::from_json(&body).map_err(|err| {
        warn!(error = %err, "rejected command payload");
        ApiError::from(err)
    })?;

    state.queue.push(record)?;
    Ok(QUEUED_BODY)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

/// The CORS layer only advertises methods and headers on preflight; plain
/// responses get them here.
async fn stamp_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers
        .entry(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .or_insert(HeaderValue::from_static("*"));
    headers
        .entry(header::ACCESS_CONTROL_ALLOW_METHODS)
        .or_insert(HeaderValue::from_static(ALLOWED_METHODS));
    headers
        .entry(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .or_insert(HeaderValue::from_static(ALLOWED_HEADERS));
    response
}
