//! Shared HTTP plumbing for the Hookdeck and Okta clients.

use std::time::Duration;

use reqwest::{header::HeaderMap, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// User agent sent on every outbound API request.
pub const USER_AGENT: &str = concat!("hookrelay/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used by a single tool run.
pub fn build_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(ApiError::Client)
}

/// Build standard JSON API headers on top of a request.
pub fn json_headers(request: RequestBuilder) -> RequestBuilder {
    request
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
}

/// A fully buffered response.
#[derive(Debug)]
pub struct RawResponse {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    /// Turn non-2xx responses into [`ApiError::Status`], keeping the body.
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.status.is_success() {
            return Ok(self);
        }

        Err(ApiError::Status {
            method: self.method,
            url: self.url,
            status: self.status.as_u16(),
            body: self.body,
        })
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|source| ApiError::Decode {
            method: self.method.clone(),
            url: self.url.clone(),
            body: self.body.clone(),
            source,
        })
    }
}

/// Send a request and buffer the whole response. Only transport failures are
/// errors here; status handling is left to the caller.
pub async fn execute(
    request: RequestBuilder,
    method: Method,
    url: &str,
) -> Result<RawResponse, ApiError> {
    let response = request.send().await.map_err(|source| ApiError::Transport {
        method: method.clone(),
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await.map_err(|source| ApiError::Transport {
        method: method.clone(),
        url: url.to_string(),
        source,
    })?;

    Ok(RawResponse {
        method,
        url: url.to_string(),
        status,
        headers,
        body,
    })
}

/// Send a request, require a 2xx status and decode the JSON body.
pub async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    method: Method,
    url: &str,
) -> Result<T, ApiError> {
    execute(request, method, url)
        .await?
        .error_for_status()?
        .json()
}
