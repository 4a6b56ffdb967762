//! Error types shared by the Hookdeck and Okta clients and the setup flow.

use reqwest::Method;
use thiserror::Error;

/// Configuration errors raised before any remote call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} must be set")]
    Missing(&'static str),

    #[error("invalid URL in {name} ({value}): {source}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Failure of a single remote API call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to execute request {method} {url}: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("api request {method} {url} failed with status {status}: {body}")]
    Status {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    #[error("error decoding response from {method} {url}: {source}. Body: {body}")]
    Decode {
        method: Method,
        url: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limit exceeded after {retries} retries: {url}")]
    RateLimited { url: String, retries: u32 },
}

impl ApiError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure looks like a name clash on create.
    ///
    /// Okta answers a duplicate event hook name with 400 (E0000001); 409 is
    /// accepted too.
    pub fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(400) | Some(409))
    }
}

/// Unrecoverable failure of the integration setup run.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("error creating/updating Hookdeck connection: {0}")]
    Connection(#[source] ApiError),

    #[error("Hookdeck connection '{0}' was returned without a source URL")]
    MissingSourceUrl(String),

    #[error("error creating Okta event hook: {0}")]
    CreateHook(#[source] ApiError),

    #[error("error listing Okta event hooks: {0}")]
    ListHooks(#[source] ApiError),

    #[error("create failed, but could not find existing Okta event hook with name '{name}'. Original create error: {create_error}")]
    HookNotFound {
        name: String,
        #[source]
        create_error: ApiError,
    },

    #[error("Okta event hook '{0}' has no ID")]
    HookMissingId(String),

    #[error("error replacing Okta event hook '{name}' (ID: {id}): {source}")]
    ReplaceHook {
        name: String,
        id: String,
        #[source]
        source: ApiError,
    },
}
