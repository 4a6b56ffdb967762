//! Web server module for receiving Hookdeck webhooks.
//!
//! This module provides a small web server that:
//! - Accepts POSTed webhooks on any path
//! - Verifies the Hookdeck HMAC signature when a secret is configured
//! - Logs the payload and acknowledges immediately

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};

pub use handlers::{
    health, inbound_webhook, pretty_json, AcceptedResponse, AppState, ErrorResponse,
    HealthResponse, JsonPolicy,
};
pub use signature::{
    compute_signature, is_signature_verification_enabled, SignatureVerifier, SIGNATURE_HEADER,
    SIGNATURE_HEADER_ROTATED,
};

/// Build the receiver router.
///
/// `GET /health` is the only non-webhook route; every path accepts POST.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health).post(inbound_webhook))
        .route("/", post(inbound_webhook))
        .route("/*path", post(inbound_webhook))
        .with_state(state)
}
