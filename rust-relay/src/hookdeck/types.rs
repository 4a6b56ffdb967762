//! Hookdeck API request and response types.
//!
//! Request types are strongly typed since we build them. Response types only
//! require the identifiers we act on; everything the API may leave out is an
//! `Option`.

use serde::{Deserialize, Serialize};

/// Hookdeck REST API version used for every call.
pub const API_VERSION: &str = "2025-01-01";

// =============================================================================
// Upsert Connection (PUT /connections)
// =============================================================================

/// Body of `PUT /{version}/connections`. The connection name is the
/// idempotency key: an existing connection with the same name is updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertConnectionRequest {
    pub name: String,
    pub source: SourceInput,
    pub destination: DestinationInput,
}

/// Inline source definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceInput {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub config: SourceConfig,
}

impl SourceInput {
    /// A generic webhook source that requires `header_key: api_key` on every
    /// inbound request.
    pub fn webhook_with_api_key(
        name: impl Into<String>,
        header_key: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_type: "WEBHOOK".to_string(),
            config: SourceConfig {
                auth_type: "API_KEY".to_string(),
                auth: ApiKeyAuth {
                    header_key: header_key.into(),
                    api_key: api_key.into(),
                },
            },
        }
    }
}

/// Source authentication config.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceConfig {
    pub auth_type: String,
    pub auth: ApiKeyAuth,
}

/// Header based shared-secret auth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiKeyAuth {
    pub header_key: String,
    pub api_key: String,
}

/// Inline destination definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationInput {
    pub name: String,
    #[serde(rename = "type")]
    pub destination_type: String,
    pub config: DestinationConfig,
}

impl DestinationInput {
    /// Deliver to a public HTTP endpoint.
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination_type: "HTTP".to_string(),
            config: DestinationConfig::Http { url: url.into() },
        }
    }

    /// Deliver to a local machine through `hookdeck listen`.
    pub fn cli(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination_type: "CLI".to_string(),
            config: DestinationConfig::Cli { path: path.into() },
        }
    }
}

/// Destination target config, shaped by destination type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DestinationConfig {
    Http { url: String },
    Cli { path: String },
}

// =============================================================================
// Responses
// =============================================================================

/// Connection as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub source: Source,
    pub destination: Destination,
}

/// Source as returned by the API. `url` is the ingestion URL senders post to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub source_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// Destination as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub destination_type: Option<String>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// One page of a list endpoint (`/events`, `/requests`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub models: Vec<serde_json::Value>,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub count: Option<u64>,
}

/// Cursor pagination info.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upsert_request_shape_http() {
        let request = UpsertConnectionRequest {
            name: "okta-to-hookdeck".to_string(),
            source: SourceInput::webhook_with_api_key("okta", "x-webhook-key", "s3cr3t"),
            destination: DestinationInput::http("my-http-endpoint", "https://example.com/hooks"),
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "okta-to-hookdeck",
                "source": {
                    "name": "okta",
                    "type": "WEBHOOK",
                    "config": {
                        "auth_type": "API_KEY",
                        "auth": {"header_key": "x-webhook-key", "api_key": "s3cr3t"}
                    }
                },
                "destination": {
                    "name": "my-http-endpoint",
                    "type": "HTTP",
                    "config": {"url": "https://example.com/hooks"}
                }
            })
        );
    }

    #[test]
    fn test_cli_destination_shape() {
        let value = serde_json::to_value(DestinationInput::cli("hookdeck-cli", "/")).unwrap();
        assert_eq!(
            value,
            json!({"name": "hookdeck-cli", "type": "CLI", "config": {"path": "/"}})
        );
    }

    #[test]
    fn test_connection_tolerates_missing_optionals() {
        let connection: Connection = serde_json::from_value(json!({
            "id": "web_123",
            "source": {"id": "src_1", "name": "okta"},
            "destination": {"id": "des_1", "name": "hookdeck-cli"}
        }))
        .unwrap();

        assert_eq!(connection.id, "web_123");
        assert!(connection.name.is_none());
        assert!(connection.source.url.is_none());
        assert!(connection.destination.destination_type.is_none());
    }

    #[test]
    fn test_page_defaults() {
        let page: Page = serde_json::from_value(json!({"models": [{"id": "evt_1"}]})).unwrap();
        assert_eq!(page.models.len(), 1);
        assert!(page.pagination.next.is_none());
        assert!(page.count.is_none());
    }
}
