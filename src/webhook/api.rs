use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::db::DbHandle;
use super::engine::{Delivery, process_delivery};
use super::models::WebhookOutcome;
use super::signature::{SignatureError, SignatureVerifier};
use crate::errors::{ErrorKind, SyncError};

const HEADER_EVENT: &str = "X-GitHub-Event";
const HEADER_DELIVERY: &str = "X-GitHub-Delivery";
const HEADER_SIGNATURE: &str = "X-Hub-Signature-256";

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub verifier: SignatureVerifier,
    pub max_body_bytes: usize,
}

pub type SharedState = Arc<AppState>;

// ── Response envelope ─────────────────────────────────────────────────

#[derive(Serialize)]
struct DataEnvelope<T: Serialize> {
    data: T,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        let status = match err.kind() {
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Store details stay in the logs.
        let message = match err.kind() {
            ErrorKind::Persistence => match &err {
                SyncError::DeliveryLog(_) => "failed to log event".to_string(),
                _ => "failed to update tasks".to_string(),
            },
            _ => err.to_string(),
        };
        Self {
            status,
            code: err.code(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(DataEnvelope { data })).into_response()
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/webhooks/github", post(github_webhook))
        .route("/api/v1/webhooks/github", post(github_webhook))
        .route("/healthz", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

fn required_header(headers: &HeaderMap, name: &'static str) -> Result<String, SyncError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(SyncError::MissingHeader(name))
}

fn log_rejection(delivery_id: Option<&str>, err: &SyncError) {
    let delivery_id = delivery_id.unwrap_or("-");
    match err.kind() {
        ErrorKind::Persistence => {
            error!(delivery_id, code = err.code(), error = ?err, "Webhook processing failed")
        }
        _ => warn!(delivery_id, code = err.code(), error = %err, "Webhook rejected"),
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check(State(state): State<SharedState>) -> Response {
    match state.db.call(|db| db.ping()).await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database not ready").into_response()
        }
    }
}

/// Receive one GitHub delivery.
///
/// Headers are checked first, then the body is read up to the configured cap
/// and authenticated before anything touches the store.
async fn github_webhook(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    let delivery_id = headers
        .get(HEADER_DELIVERY)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let result = handle_delivery(&state, &headers, body).await;
    match result {
        Ok(outcome) => Ok(ok(outcome)),
        Err(err) => {
            log_rejection(delivery_id.as_deref(), &err);
            Err(err.into())
        }
    }
}

async fn handle_delivery(
    state: &SharedState,
    headers: &HeaderMap,
    body: Body,
) -> Result<WebhookOutcome, SyncError> {
    let event_type = required_header(headers, HEADER_EVENT)?;
    let delivery_id = required_header(headers, HEADER_DELIVERY)?;

    let body = to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| SyncError::UnreadableBody(e.to_string()))?;

    // An absent signature fails authentication like a wrong one.
    let signature = required_header(headers, HEADER_SIGNATURE)
        .map_err(|_| SignatureError::Missing)?;
    state.verifier.verify(&body, &signature)?;

    debug!(delivery_id = %delivery_id, event_type = %event_type, "Verified webhook");

    let delivery = Delivery {
        id: delivery_id,
        event_type,
        body: body.to_vec(),
    };
    let now = chrono::Utc::now();
    let outcome = state
        .db
        .call(move |db| {
            let result = process_delivery(db, &delivery, now);
            Ok((delivery, result))
        })
        .await
        .map_err(SyncError::DeliveryLog)
        .and_then(|(delivery, result)| {
            let outcome = result?;
            match &outcome {
                WebhookOutcome::Applied { updated, event } => info!(
                    delivery_id = %delivery.id,
                    event = %event,
                    updated,
                    "Webhook applied"
                ),
                WebhookOutcome::Ignored { ignored_event } => info!(
                    delivery_id = %delivery.id,
                    event = %ignored_event,
                    "Webhook event ignored"
                ),
                WebhookOutcome::Duplicate { .. } => info!(
                    delivery_id = %delivery.id,
                    "Duplicate webhook delivery"
                ),
            }
            Ok(outcome)
        })?;
    Ok(outcome)
}
