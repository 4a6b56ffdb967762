//! Webhook endpoint handlers.
//!
//! The inbound handler:
//! 1. Reads the raw body exactly as received
//! 2. Verifies the Hookdeck signature (if a secret is configured)
//! 3. Logs the pretty-printed payload
//! 4. Acknowledges with `{"status":"ACCEPTED"}`

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::ReceiverConfig;
use crate::web::signature::SignatureVerifier;

/// What to do with a verified body that is not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonPolicy {
    /// Log the raw body and accept the request.
    #[default]
    Lenient,
    /// Answer 500 with "failed to format JSON".
    Strict,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<SignatureVerifier>,
    pub json_policy: JsonPolicy,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &ReceiverConfig) -> Self {
        Self {
            verifier: Arc::new(SignatureVerifier::new(config.webhook_secret.clone())),
            json_policy: if config.strict_json {
                JsonPolicy::Strict
            } else {
                JsonPolicy::Lenient
            },
            max_body_bytes: config.max_body_bytes,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Inbound Webhook
// =============================================================================

/// Acknowledgement returned for accepted webhooks.
#[derive(Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
}

/// Error body for rejected webhooks.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: &'static str,
}

fn reject(status: StatusCode, message: &'static str) -> Response {
    (status, Json(ErrorResponse { message })).into_response()
}

/// Inbound webhook endpoint, mounted for POST on every path.
pub async fn inbound_webhook(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let path = uri.path().to_string();

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(b) => b,
        Err(e) => {
            error!(path = %path, error = %e, "webhook_body_read_failed");
            return reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "could not get request body data",
            );
        }
    };

    if !state.verifier.verify(&bytes, &headers) {
        warn!(path = %path, body_length = bytes.len(), "webhook_signature_invalid");
        return reject(StatusCode::UNAUTHORIZED, "invalid payload");
    }

    let payload = match pretty_json(&bytes) {
        Ok(pretty) => pretty,
        Err(e) => match state.json_policy {
            JsonPolicy::Strict => {
                error!(path = %path, error = %e, "webhook_json_format_failed");
                return reject(StatusCode::INTERNAL_SERVER_ERROR, "failed to format JSON");
            }
            JsonPolicy::Lenient => {
                warn!(path = %path, error = %e, "webhook_payload_not_json");
                String::from_utf8_lossy(&bytes).into_owned()
            }
        },
    };

    info!(path = %path, payload = %payload, "webhook_received");

    (StatusCode::OK, Json(AcceptedResponse { status: "ACCEPTED" })).into_response()
}

/// Re-indent a JSON document with two spaces, keeping key order and number
/// literals as written.
pub fn pretty_json(body: &[u8]) -> Result<String, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    serde_json::to_string_pretty(&value)
}
