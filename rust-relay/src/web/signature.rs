//! Hookdeck webhook signature verification.
//!
//! Hookdeck signs every forwarded request with HMAC-SHA256 over the raw body,
//! base64 encoded, in `x-hookdeck-signature`. During secret rotation a second
//! signature made with the new secret is sent in `x-hookdeck-signature-2`.
//! Reference: https://hookdeck.com/docs/authentication#hookdeck-webhook-signature-verification

use std::fmt;

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Primary signature header.
pub const SIGNATURE_HEADER: &str = "x-hookdeck-signature";

/// Signature header carrying the rotated secret's digest.
pub const SIGNATURE_HEADER_ROTATED: &str = "x-hookdeck-signature-2";

/// Verifies request bodies against the configured signing secret.
///
/// A verifier built without a secret accepts every request. That is the
/// documented local-development mode, and the receiver warns about it on
/// startup.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Option<String>,
}

impl SignatureVerifier {
    /// Create a verifier. Empty or whitespace-only secrets disable verification.
    pub fn new(secret: Option<String>) -> Self {
        if !is_signature_verification_enabled(&secret) {
            return Self { secret: None };
        }
        Self { secret }
    }

    /// Whether requests are actually checked.
    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify `body` against the signature headers in `headers`.
    ///
    /// `body` must be the exact bytes received on the wire. Returns `true` when
    /// either signature header matches, or when verification is disabled.
    pub fn verify(&self, body: &[u8], headers: &HeaderMap) -> bool {
        let secret = match self.secret.as_deref() {
            Some(s) => s,
            None => {
                debug!("signature_verification_skipped");
                return true;
            }
        };

        let provided: Vec<&[u8]> = [SIGNATURE_HEADER, SIGNATURE_HEADER_ROTATED]
            .iter()
            .filter_map(|name| headers.get(*name))
            .map(|value| value.as_bytes())
            .filter(|value| !value.is_empty())
            .collect();

        if provided.is_empty() {
            warn!("hookdeck_signature_missing");
            return false;
        }

        let valid = provided
            .iter()
            .any(|signature| signature_matches(secret, body, signature));

        if !valid {
            warn!(
                signatures_provided = provided.len(),
                body_length = body.len(),
                "hookdeck_signature_mismatch"
            );
        }

        valid
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Compute the base64 HMAC-SHA256 signature Hookdeck would send for `body`.
///
/// Returns `None` only if the secret cannot key the MAC.
pub fn compute_signature(secret: &str, body: &[u8]) -> Option<String> {
    let mac = keyed_mac(secret, body)?;
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Check if signature verification is enabled for the given secret.
pub fn is_signature_verification_enabled(secret: &Option<String>) -> bool {
    secret
        .as_ref()
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}

/// Constant-time check of one provided signature.
fn signature_matches(secret: &str, body: &[u8], provided: &[u8]) -> bool {
    let decoded = match STANDARD.decode(provided) {
        Ok(d) => d,
        Err(e) => {
            debug!(error = %e, "hookdeck_signature_not_base64");
            return false;
        }
    };

    match keyed_mac(secret, body) {
        Some(mac) => mac.verify_slice(&decoded).is_ok(),
        None => false,
    }
}

/// HMAC-SHA256 keyed with `secret` and fed `body`.
fn keyed_mac(secret: &str, body: &[u8]) -> Option<HmacSha256> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "hookdeck_signature_invalid_key");
            return None;
        }
    };
    mac.update(body);
    Some(mac)
}
