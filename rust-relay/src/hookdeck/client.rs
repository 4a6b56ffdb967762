//! Hookdeck REST API client.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use tracing::info;

use crate::error::ApiError;
use crate::hookdeck::types::{Connection, UpsertConnectionRequest, API_VERSION};
use crate::util::http::{json_headers, send_json};

/// Connection management, as used by the setup flow.
#[async_trait]
pub trait ConnectionApi: Send + Sync {
    /// Create or update a connection keyed by its name.
    async fn upsert_connection(
        &self,
        request: &UpsertConnectionRequest,
    ) -> Result<Connection, ApiError>;
}

/// Thin client over the versioned Hookdeck API.
#[derive(Clone)]
pub struct HookdeckClient {
    http: Client,
    base_url: String,
    api_version: String,
    api_key: String,
}

impl HookdeckClient {
    /// Create a client for `base_url` (e.g. `https://api.hookdeck.com`).
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: API_VERSION.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Pin a different API version.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Absolute URL of a versioned endpoint, e.g. `endpoint("connections")`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    /// Start an authenticated request.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        json_headers(self.http.request(method, url)).bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl ConnectionApi for HookdeckClient {
    async fn upsert_connection(
        &self,
        request: &UpsertConnectionRequest,
    ) -> Result<Connection, ApiError> {
        let url = self.endpoint("connections");

        info!(
            connection_name = %request.name,
            source_name = %request.source.name,
            destination_name = %request.destination.name,
            destination_type = %request.destination.destination_type,
            "hookdeck_connection_upserting"
        );

        let connection: Connection = send_json(
            self.request(Method::PUT, &url).json(request),
            Method::PUT,
            &url,
        )
        .await?;

        info!(
            connection_id = %connection.id,
            source_url = ?connection.source.url,
            "hookdeck_connection_upserted"
        );

        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hookdeck::types::{DestinationInput, SourceInput};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn upsert_request() -> UpsertConnectionRequest {
        UpsertConnectionRequest {
            name: "okta-to-hookdeck".to_string(),
            source: SourceInput::webhook_with_api_key("okta", "x-webhook-key", "abc"),
            destination: DestinationInput::cli("hookdeck-cli", "/"),
        }
    }

    #[test]
    fn test_endpoint_joins_version() {
        let client = HookdeckClient::new(Client::new(), "https://api.hookdeck.com/", "key");
        assert_eq!(
            client.endpoint("/connections"),
            "https://api.hookdeck.com/2025-01-01/connections"
        );

        let client = client.with_api_version("2024-09-01");
        assert_eq!(client.api_version(), "2024-09-01");
        assert_eq!(
            client.endpoint("events"),
            "https://api.hookdeck.com/2024-09-01/events"
        );
    }

    #[tokio::test]
    async fn test_upsert_connection_success() {
        let server = MockServer::start().await;
        let request = upsert_request();

        Mock::given(method("PUT"))
            .and(path("/2025-01-01/connections"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_json(serde_json::to_value(&request).unwrap()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "web_1",
                "name": "okta-to-hookdeck",
                "source": {
                    "id": "src_1",
                    "name": "okta",
                    "type": "WEBHOOK",
                    "url": "https://hkdk.events/abc"
                },
                "destination": {"id": "des_1", "name": "hookdeck-cli", "type": "CLI"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HookdeckClient::new(Client::new(), server.uri(), "test-key");
        let connection = client.upsert_connection(&request).await.unwrap();

        assert_eq!(connection.id, "web_1");
        assert_eq!(
            connection.source.url.as_deref(),
            Some("https://hkdk.events/abc")
        );
    }

    #[tokio::test]
    async fn test_upsert_connection_error_includes_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/2025-01-01/connections"))
            .respond_with(
                ResponseTemplate::new(422).set_body_string(r#"{"message":"invalid destination"}"#),
            )
            .mount(&server)
            .await;

        let client = HookdeckClient::new(Client::new(), server.uri(), "test-key");
        let err = client.upsert_connection(&upsert_request()).await.unwrap_err();

        assert_eq!(err.status(), Some(422));
        assert!(err.to_string().contains("invalid destination"));
    }

    #[tokio::test]
    async fn test_upsert_connection_bad_json() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/2025-01-01/connections"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = HookdeckClient::new(Client::new(), server.uri(), "test-key");
        let err = client.upsert_connection(&upsert_request()).await.unwrap_err();

        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
