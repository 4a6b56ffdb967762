//! Configuration module for environment variable parsing.
//!
//! Each binary reads its own configuration once at startup. The receiver has
//! sensible defaults for everything; the setup and export tools fail fast when a
//! required credential is missing.

use std::env;
use tracing::warn;

use crate::error::ConfigError;

/// Default port for the webhook receiver.
pub const DEFAULT_PORT: u16 = 3032;

/// Default maximum accepted request body size (2 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Default Hookdeck API base URL.
pub const DEFAULT_HOOKDECK_API_URL: &str = "https://api.hookdeck.com";

/// Default outbound HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Webhook receiver configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Port for the web server to listen on
    pub port: u16,

    /// Hookdeck signing secret; verification is skipped when unset
    pub webhook_secret: Option<String>,

    /// Reject verified payloads that are not valid JSON with a 500
    pub strict_json: bool,

    /// Maximum request body size in bytes
    pub max_body_bytes: usize,
}

impl ReceiverConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        ReceiverConfig {
            port: parse_or("PORT", DEFAULT_PORT),
            webhook_secret: env::var("HOOKDECK_WEBHOOK_SECRET").ok(),
            strict_json: parse_bool("HOOKDECK_STRICT_JSON", false),
            max_body_bytes: parse_or("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            webhook_secret: None,
            strict_json: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Integration setup configuration.
#[derive(Debug, Clone)]
pub struct SetupConfig {
    /// Hookdeck API key (Bearer token)
    pub hookdeck_api_key: String,

    /// Hookdeck API base URL, without version segment
    pub hookdeck_api_url: String,

    /// Okta org domain, with or without scheme
    pub okta_domain: String,

    /// Okta API token (SSWS)
    pub okta_api_token: String,

    /// Public destination URL; the Hookdeck CLI destination is used when unset
    pub webhook_destination_url: Option<String>,

    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl SetupConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(SetupConfig {
            hookdeck_api_key: required("HOOKDECK_API_KEY")?,
            hookdeck_api_url: non_empty("HOOKDECK_API_URL")
                .unwrap_or_else(|| DEFAULT_HOOKDECK_API_URL.to_string()),
            okta_domain: required("OKTA_DOMAIN")?,
            okta_api_token: required("OKTA_API_TOKEN")?,
            webhook_destination_url: non_empty("WEBHOOK_DESTINATION_URL"),
            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS),
        })
    }
}

/// Event export configuration. Filters come from the command line.
#[derive(Debug, Clone)]
pub struct EventsConfig {
    pub hookdeck_api_key: String,
    pub hookdeck_api_url: String,
    pub request_timeout_ms: u64,
}

impl EventsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(EventsConfig {
            hookdeck_api_key: required("HOOKDECK_API_KEY")?,
            hookdeck_api_url: non_empty("HOOKDECK_API_URL")
                .unwrap_or_else(|| DEFAULT_HOOKDECK_API_URL.to_string()),
            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS),
        })
    }
}

/// Read a variable, treating empty values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    non_empty(name).ok_or(ConfigError::Missing(name))
}

/// Parse a variable, falling back to the default when unset or invalid.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Parse a boolean flag such as "true", "1", "yes" or "off".
fn parse_bool(name: &str, default: bool) -> bool {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" | "" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid boolean, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_valid() {
        env::set_var("TEST_RELAY_PORT", "4000");
        let result: u16 = parse_or("TEST_RELAY_PORT", 1);
        assert_eq!(result, 4000);
        env::remove_var("TEST_RELAY_PORT");
    }

    #[test]
    fn test_parse_or_invalid_uses_default() {
        env::set_var("TEST_RELAY_BAD_PORT", "not-a-port");
        let result: u16 = parse_or("TEST_RELAY_BAD_PORT", 3032);
        assert_eq!(result, 3032);
        env::remove_var("TEST_RELAY_BAD_PORT");
    }

    #[test]
    fn test_parse_or_default() {
        let result: u64 = parse_or("NONEXISTENT_RELAY_VAR", 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_parse_bool() {
        env::set_var("TEST_RELAY_BOOL_TRUE", "Yes");
        env::set_var("TEST_RELAY_BOOL_FALSE", "0");
        env::set_var("TEST_RELAY_BOOL_JUNK", "maybe");
        assert!(parse_bool("TEST_RELAY_BOOL_TRUE", false));
        assert!(!parse_bool("TEST_RELAY_BOOL_FALSE", true));
        assert!(parse_bool("TEST_RELAY_BOOL_JUNK", true));
        assert!(!parse_bool("NONEXISTENT_RELAY_BOOL", false));
        env::remove_var("TEST_RELAY_BOOL_TRUE");
        env::remove_var("TEST_RELAY_BOOL_FALSE");
        env::remove_var("TEST_RELAY_BOOL_JUNK");
    }

    #[test]
    fn test_required_rejects_blank() {
        env::set_var("TEST_RELAY_BLANK", "   ");
        let err = required("TEST_RELAY_BLANK").unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TEST_RELAY_BLANK")));
        env::remove_var("TEST_RELAY_BLANK");
    }

    #[test]
    fn test_receiver_defaults() {
        let config = ReceiverConfig::default();
        assert_eq!(config.port, 3032);
        assert!(config.webhook_secret.is_none());
        assert!(!config.strict_json);
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }
}
