//! Okta event hook management API.
//!
//! Reference: https://developer.okta.com/docs/api/openapi/okta-management/management/tag/EventHook/

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use tracing::{info, warn};

use crate::error::{ApiError, ConfigError};
use crate::okta::types::EventHook;
use crate::util::http::{json_headers, send_json};

/// Event hook operations used by the setup flow.
#[async_trait]
pub trait EventHookApi: Send + Sync {
    async fn create_event_hook(&self, hook: &EventHook) -> Result<EventHook, ApiError>;

    async fn list_event_hooks(&self) -> Result<Vec<EventHook>, ApiError>;

    async fn replace_event_hook(&self, id: &str, hook: &EventHook) -> Result<EventHook, ApiError>;

    /// Ask Okta to run the one-time verification handshake against the hook URI.
    async fn verify_event_hook(&self, id: &str) -> Result<EventHook, ApiError>;
}

/// Okta management API client authenticated with an SSWS API token.
#[derive(Clone)]
pub struct OktaClient {
    http: Client,
    org_url: String,
    api_token: String,
}

impl OktaClient {
    /// `org_url` should already be normalized with [`normalize_org_url`].
    pub fn new(http: Client, org_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            http,
            org_url: org_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        }
    }

    pub fn org_url(&self) -> &str {
        &self.org_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.org_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        json_headers(self.http.request(method, url))
            .header("Authorization", format!("SSWS {}", self.api_token))
    }
}

#[async_trait]
impl EventHookApi for OktaClient {
    async fn create_event_hook(&self, hook: &EventHook) -> Result<EventHook, ApiError> {
        let url = self.url("eventHooks");
        info!(hook_name = %hook.name, "okta_event_hook_creating");
        send_json(self.request(Method::POST, &url).json(hook), Method::POST, &url).await
    }

    async fn list_event_hooks(&self) -> Result<Vec<EventHook>, ApiError> {
        let url = self.url("eventHooks");
        let hooks: Vec<EventHook> =
            send_json(self.request(Method::GET, &url), Method::GET, &url).await?;
        info!(hook_count = hooks.len(), "okta_event_hooks_listed");
        Ok(hooks)
    }

    async fn replace_event_hook(&self, id: &str, hook: &EventHook) -> Result<EventHook, ApiError> {
        let url = self.url(&format!("eventHooks/{}", id));
        info!(hook_id = %id, hook_name = %hook.name, "okta_event_hook_replacing");
        send_json(self.request(Method::PUT, &url).json(hook), Method::PUT, &url).await
    }

    async fn verify_event_hook(&self, id: &str) -> Result<EventHook, ApiError> {
        let url = self.url(&format!("eventHooks/{}/lifecycle/verify", id));
        info!(hook_id = %id, "okta_event_hook_verifying");
        send_json(self.request(Method::POST, &url), Method::POST, &url).await
    }
}

/// Turn `OKTA_DOMAIN` into an `https://` org URL.
///
/// A bare host gets `https://`; an `http://` URL is upgraded with a warning.
pub fn normalize_org_url(domain: &str) -> Result<String, ConfigError> {
    let domain = domain.trim();

    let host = if let Some(rest) = domain.strip_prefix("http://") {
        warn!(okta_domain = %domain, "okta_domain_http_upgraded_to_https");
        rest
    } else {
        domain.strip_prefix("https://").unwrap_or(domain)
    };
    let normalized = format!("https://{}", host.trim_end_matches('/'));

    let invalid = |source: url::ParseError| ConfigError::InvalidUrl {
        name: "OKTA_DOMAIN",
        value: domain.to_string(),
        source,
    };
    let parsed = url::Url::parse(&normalized).map_err(invalid)?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid(url::ParseError::EmptyHost));
    }

    Ok(normalized)
}
