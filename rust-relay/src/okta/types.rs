//! Okta event hook types.
//!
//! Okta leaves many fields out (or sends `null`) depending on the call, so
//! anything that is not required to build a hook is an `Option`.

use serde::{Deserialize, Serialize};

/// Hook status sent on create and replace.
pub const STATUS_ACTIVE: &str = "ACTIVE";

/// Okta event hook registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub events: EventSubscriptions,
    pub channel: EventHookChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<String>,
}

impl EventHook {
    /// An active HTTP hook for `event_types`, delivered to `uri` with a static
    /// auth header.
    pub fn header_auth(
        name: impl Into<String>,
        event_types: Vec<String>,
        uri: impl Into<String>,
        header_key: impl Into<String>,
        header_value: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            events: EventSubscriptions {
                subscription_type: "EVENT_TYPE".to_string(),
                items: event_types,
            },
            channel: EventHookChannel {
                channel_type: "HTTP".to_string(),
                version: "1.0.0".to_string(),
                config: EventHookChannelConfig {
                    uri: uri.into(),
                    headers: Vec::new(),
                    auth_scheme: Some(AuthScheme {
                        scheme_type: Some("HEADER".to_string()),
                        key: Some(header_key.into()),
                        value: Some(header_value.into()),
                    }),
                },
            },
            status: Some(STATUS_ACTIVE.to_string()),
            verification_status: None,
        }
    }

    pub fn id_or_na(&self) -> &str {
        self.id.as_deref().unwrap_or("N/A")
    }

    pub fn status_or_na(&self) -> &str {
        self.status.as_deref().unwrap_or("N/A")
    }
}

/// Which events the hook subscribes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSubscriptions {
    #[serde(rename = "type")]
    pub subscription_type: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Delivery channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHookChannel {
    #[serde(rename = "type")]
    pub channel_type: String,
    pub version: String,
    pub config: EventHookChannelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHookChannelConfig {
    pub uri: String,
    #[serde(default)]
    pub headers: Vec<ChannelHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_scheme: Option<AuthScheme>,
}

/// Extra static header sent with each delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelHeader {
    pub key: String,
    pub value: String,
}

/// Delivery authentication. Okta never echoes `value` back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthScheme {
    #[serde(default, rename = "type")]
    pub scheme_type: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}
