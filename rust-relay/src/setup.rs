//! Okta → Hookdeck integration setup.
//!
//! One sequential pass, safe to re-run:
//!
//! ```text
//! PUT connection (by name) → create hook ─┬─ ok ───────────────┬→ verify (best effort)
//!                                          └─ conflict → list → replace ┘
//! ```
//!
//! Both remote objects are matched by name only; nothing is stored locally.

use std::fmt;

use rand::RngCore;
use tracing::{info, warn};

use crate::error::SetupError;
use crate::hookdeck::{
    Connection, ConnectionApi, DestinationInput, SourceInput, UpsertConnectionRequest,
};
use crate::okta::{EventHook, EventHookApi, STATUS_ACTIVE};

/// Hookdeck connection name (the upsert key).
pub const CONNECTION_NAME: &str = "okta-to-hookdeck-rust-example";

/// Hookdeck source receiving Okta deliveries.
pub const OKTA_SOURCE_NAME: &str = "okta";

/// Destination name used when no public URL is configured.
pub const CLI_DESTINATION_NAME: &str = "hookdeck-cli";

/// Destination name used for `WEBHOOK_DESTINATION_URL`.
pub const HTTP_DESTINATION_NAME: &str = "my-http-endpoint";

/// Okta hook name prefix; suffixed with ` - LIVE` or ` - DEV`.
pub const EVENT_HOOK_NAME_BASE: &str = "Hookdeck Rust Example Hook";

/// Header carrying the shared secret from Okta to Hookdeck.
pub const SECRET_HEADER: &str = "x-webhook-key";

/// Okta event types the hook subscribes to.
pub const SUBSCRIBED_EVENTS: &[&str] = &["user.lifecycle.create"];

/// Everything one run needs to know up front.
#[derive(Debug, Clone)]
pub struct SetupPlan {
    pub connection_name: String,
    pub hook_name: String,
    pub destination: DestinationInput,
    pub shared_secret: String,
}

impl SetupPlan {
    /// Plan for an optional public destination URL, with a fresh secret.
    pub fn new(destination_url: Option<&str>) -> Self {
        Self::with_secret(destination_url, generate_shared_secret())
    }

    pub fn with_secret(destination_url: Option<&str>, shared_secret: String) -> Self {
        let environment = if destination_url.is_some() { "LIVE" } else { "DEV" };
        Self {
            connection_name: CONNECTION_NAME.to_string(),
            hook_name: format!("{} - {}", EVENT_HOOK_NAME_BASE, environment),
            destination: build_destination(destination_url),
            shared_secret,
        }
    }

    fn connection_request(&self) -> UpsertConnectionRequest {
        UpsertConnectionRequest {
            name: self.connection_name.clone(),
            source: SourceInput::webhook_with_api_key(
                OKTA_SOURCE_NAME,
                SECRET_HEADER,
                self.shared_secret.clone(),
            ),
            destination: self.destination.clone(),
        }
    }

    fn event_hook(&self, uri: &str) -> EventHook {
        EventHook::header_auth(
            self.hook_name.clone(),
            SUBSCRIBED_EVENTS.iter().map(|e| e.to_string()).collect(),
            uri,
            SECRET_HEADER,
            self.shared_secret.clone(),
        )
    }
}

/// HTTP destination when a URL is configured, else the Hookdeck CLI relay.
pub fn build_destination(destination_url: Option<&str>) -> DestinationInput {
    match destination_url {
        Some(url) => {
            info!(destination_url = %url, "destination_http_selected");
            DestinationInput::http(HTTP_DESTINATION_NAME, url)
        }
        None => {
            info!("destination_cli_selected");
            DestinationInput::cli(CLI_DESTINATION_NAME, "/")
        }
    }
}

/// 16 random bytes, hex encoded.
pub fn generate_shared_secret() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct SetupOutcome {
    pub connection: Connection,
    pub event_hook: EventHook,
}

impl fmt::Display for SetupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connection = &self.connection;
        let na = |v: Option<&str>| v.unwrap_or("N/A").to_string();

        writeln!(f, "--- Summary ---")?;
        writeln!(
            f,
            "Hookdeck Connection: (Name: {}, ID: {})",
            na(connection.name.as_deref()),
            connection.id
        )?;
        writeln!(
            f,
            "  - Source: '{}' (Type: {})",
            connection.source.name,
            na(connection.source.source_type.as_deref())
        )?;
        writeln!(
            f,
            "  - Destination: '{}' (Type: {})",
            connection.destination.name,
            na(connection.destination.destination_type.as_deref())
        )?;
        writeln!(
            f,
            "  - Source URL (for Okta): {}",
            na(connection.source.url.as_deref())
        )?;
        write!(
            f,
            "Okta Event Hook: '{}' (ID: {}, Status: {}) (points or should point to the URL above)",
            self.event_hook.name,
            self.event_hook.id_or_na(),
            self.event_hook.status_or_na()
        )
    }
}

/// Runs the setup against a Hookdeck and an Okta API.
pub struct IntegrationSetup<C, H> {
    connections: C,
    hooks: H,
}

impl<C: ConnectionApi, H: EventHookApi> IntegrationSetup<C, H> {
    pub fn new(connections: C, hooks: H) -> Self {
        Self { connections, hooks }
    }

    /// Execute the plan. Every remote failure aborts, except the name conflict
    /// on create (handled) and the final verification (logged).
    pub async fn run(&self, plan: &SetupPlan) -> Result<SetupOutcome, SetupError> {
        info!(
            connection_name = %plan.connection_name,
            hook_name = %plan.hook_name,
            "setup_starting"
        );

        let connection = self
            .connections
            .upsert_connection(&plan.connection_request())
            .await
            .map_err(SetupError::Connection)?;

        let source_url = connection
            .source
            .url
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SetupError::MissingSourceUrl(connection.id.clone()))?;

        info!(
            connection_id = %connection.id,
            source_url = %source_url,
            "connection_ready"
        );

        let hook = self.create_or_replace_hook(plan.event_hook(&source_url)).await?;

        let hook_id = hook
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SetupError::HookMissingId(hook.name.clone()))?;

        let event_hook = match self.hooks.verify_event_hook(&hook_id).await {
            Ok(verified) => {
                info!(
                    hook_id = %hook_id,
                    status = %verified.status_or_na(),
                    verification_status = ?verified.verification_status,
                    "event_hook_verified"
                );
                verified
            }
            Err(e) => {
                // Commonly fails because the hook is already verified.
                warn!(
                    hook_id = %hook_id,
                    status_code = ?e.status(),
                    error = %e,
                    "event_hook_verification_failed"
                );
                hook
            }
        };

        info!("setup_complete");

        Ok(SetupOutcome {
            connection,
            event_hook,
        })
    }

    async fn create_or_replace_hook(&self, hook: EventHook) -> Result<EventHook, SetupError> {
        let create_error = match self.hooks.create_event_hook(&hook).await {
            Ok(created) => {
                info!(
                    hook_name = %created.name,
                    hook_id = %created.id_or_na(),
                    status = %created.status_or_na(),
                    "event_hook_created"
                );
                return Ok(created);
            }
            Err(e) if e.is_conflict() => e,
            Err(e) => return Err(SetupError::CreateHook(e)),
        };

        info!(
            hook_name = %hook.name,
            status_code = ?create_error.status(),
            "event_hook_exists_replacing"
        );

        let existing = self
            .hooks
            .list_event_hooks()
            .await
            .map_err(SetupError::ListHooks)?;

        let matches: Vec<&EventHook> = existing.iter().filter(|h| h.name == hook.name).collect();

        let target = match matches.first() {
            Some(first) => *first,
            None => {
                return Err(SetupError::HookNotFound {
                    name: hook.name.clone(),
                    create_error,
                })
            }
        };

        if matches.len() > 1 {
            warn!(
                hook_name = %hook.name,
                match_count = matches.len(),
                selected_id = %target.id_or_na(),
                "event_hook_multiple_matches"
            );
        }

        let id = target
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SetupError::HookMissingId(hook.name.clone()))?;

        let mut replacement = hook;
        replacement.status = Some(STATUS_ACTIVE.to_string());

        let replaced = self
            .hooks
            .replace_event_hook(&id, &replacement)
            .await
            .map_err(|source| SetupError::ReplaceHook {
                name: replacement.name.clone(),
                id: id.clone(),
                source,
            })?;

        info!(
            hook_name = %replaced.name,
            hook_id = %replaced.id_or_na(),
            status = %replaced.status_or_na(),
            "event_hook_replaced"
        );

        Ok(replaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::hookdeck::types::{Destination, Source};
    use async_trait::async_trait;
    use reqwest::Method;
    use std::sync::Mutex;

    const SOURCE_URL: &str = "https://hkdk.events/src_abc";

    fn status_error(status: u16) -> ApiError {
        ApiError::Status {
            method: Method::POST,
            url: "https://dev.okta.com/api/v1/eventHooks".to_string(),
            status,
            body: "{}".to_string(),
        }
    }

    fn connection(source_url: Option<&str>) -> Connection {
        Connection {
            id: "web_1".to_string(),
            name: Some(CONNECTION_NAME.to_string()),
            source: Source {
                id: "src_1".to_string(),
                name: OKTA_SOURCE_NAME.to_string(),
                source_type: Some("WEBHOOK".to_string()),
                url: source_url.map(str::to_string),
                config: None,
            },
            destination: Destination {
                id: "des_1".to_string(),
                name: CLI_DESTINATION_NAME.to_string(),
                destination_type: Some("CLI".to_string()),
                config: None,
            },
        }
    }

    fn existing(id: Option<&str>, name: &str) -> EventHook {
        let mut hook = EventHook::header_auth(name, vec![], "https://old", SECRET_HEADER, "old");
        hook.id = id.map(str::to_string);
        hook.status = Some("INACTIVE".to_string());
        hook
    }

    struct FakeConnections {
        result: Mutex<Option<Result<Connection, ApiError>>>,
        requests: Mutex<Vec<UpsertConnectionRequest>>,
    }

    impl FakeConnections {
        fn returning(result: Result<Connection, ApiError>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl<'a> ConnectionApi for &'a FakeConnections {
        async fn upsert_connection(
            &self,
            request: &UpsertConnectionRequest,
        ) -> Result<Connection, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            self.result.lock().unwrap().take().expect("single upsert")
        }
    }

    #[derive(Default)]
    struct FakeHooks {
        create_status: Option<u16>,
        listed: Vec<EventHook>,
        verify_fails: bool,
        calls: Mutex<Vec<String>>,
        sent: Mutex<Vec<EventHook>>,
    }

    impl FakeHooks {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl<'a> EventHookApi for &'a FakeHooks {
        async fn create_event_hook(&self, hook: &EventHook) -> Result<EventHook, ApiError> {
            self.calls.lock().unwrap().push("create".to_string());
            self.sent.lock().unwrap().push(hook.clone());
            match self.create_status {
                Some(status) => Err(status_error(status)),
                None => {
                    let mut created = hook.clone();
                    created.id = Some("who_new".to_string());
                    Ok(created)
                }
            }
        }

        async fn list_event_hooks(&self) -> Result<Vec<EventHook>, ApiError> {
            self.calls.lock().unwrap().push("list".to_string());
            Ok(self.listed.clone())
        }

        async fn replace_event_hook(
            &self,
            id: &str,
            hook: &EventHook,
        ) -> Result<EventHook, ApiError> {
            self.calls.lock().unwrap().push(format!("replace:{}", id));
            self.sent.lock().unwrap().push(hook.clone());
            let mut replaced = hook.clone();
            replaced.id = Some(id.to_string());
            Ok(replaced)
        }

        async fn verify_event_hook(&self, id: &str) -> Result<EventHook, ApiError> {
            self.calls.lock().unwrap().push(format!("verify:{}", id));
            if self.verify_fails {
                return Err(status_error(400));
            }
            let mut verified = existing(Some(id), "verified");
            verified.status = Some(STATUS_ACTIVE.to_string());
            verified.verification_status = Some("VERIFIED".to_string());
            Ok(verified)
        }
    }

    fn plan() -> SetupPlan {
        SetupPlan::with_secret(None, "0123456789abcdef".to_string())
    }

    #[test]
    fn test_plan_names_and_destination() {
        let dev = SetupPlan::with_secret(None, "s".to_string());
        assert_eq!(dev.hook_name, "Hookdeck Rust Example Hook - DEV");
        assert_eq!(dev.destination.destination_type, "CLI");

        let live = SetupPlan::with_secret(Some("https://example.com/hooks"), "s".to_string());
        assert_eq!(live.hook_name, "Hookdeck Rust Example Hook - LIVE");
        assert_eq!(live.destination.destination_type, "HTTP");
        assert_eq!(live.destination.name, HTTP_DESTINATION_NAME);
    }

    #[test]
    fn test_generate_shared_secret() {
        let a = generate_shared_secret();
        let b = generate_shared_secret();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_ne!(a, "0".repeat(32));
    }

    #[tokio::test]
    async fn test_fresh_setup_creates_and_verifies() {
        let connections = FakeConnections::returning(Ok(connection(Some(SOURCE_URL))));
        let hooks = FakeHooks::default();

        let outcome = IntegrationSetup::new(&connections, &hooks)
            .run(&plan())
            .await
            .unwrap();

        assert_eq!(hooks.calls(), vec!["create", "verify:who_new"]);
        assert_eq!(outcome.event_hook.verification_status.as_deref(), Some("VERIFIED"));

        let request = connections.requests.lock().unwrap()[0].clone();
        assert_eq!(request.name, CONNECTION_NAME);
        assert_eq!(request.source.config.auth.header_key, SECRET_HEADER);
        assert_eq!(request.source.config.auth.api_key, "0123456789abcdef");

        let sent = hooks.sent.lock().unwrap()[0].clone();
        assert_eq!(sent.channel.config.uri, SOURCE_URL);
        let scheme = sent.channel.config.auth_scheme.unwrap();
        assert_eq!(scheme.value.as_deref(), Some("0123456789abcdef"));
        assert_eq!(sent.events.items, vec!["user.lifecycle.create".to_string()]);
    }

    #[tokio::test]
    async fn test_conflict_replaces_matching_hook() {
        let connections = FakeConnections::returning(Ok(connection(Some(SOURCE_URL))));
        let hooks = FakeHooks {
            create_status: Some(400),
            listed: vec![
                existing(Some("who_other"), "Something else"),
                existing(Some("who_existing"), &plan().hook_name),
            ],
            ..Default::default()
        };

        let outcome = IntegrationSetup::new(&connections, &hooks)
            .run(&plan())
            .await
            .unwrap();

        assert_eq!(
            hooks.calls(),
            vec!["create", "list", "replace:who_existing", "verify:who_existing"]
        );
        let replacement = hooks.sent.lock().unwrap()[1].clone();
        assert_eq!(replacement.status.as_deref(), Some(STATUS_ACTIVE));
        assert_eq!(replacement.channel.config.uri, SOURCE_URL);
        assert_eq!(outcome.event_hook.id.as_deref(), Some("who_existing"));
    }

    #[tokio::test]
    async fn test_conflict_with_duplicates_replaces_first() {
        let connections = FakeConnections::returning(Ok(connection(Some(SOURCE_URL))));
        let name = plan().hook_name;
        let hooks = FakeHooks {
            create_status: Some(409),
            listed: vec![existing(Some("who_a"), &name), existing(Some("who_b"), &name)],
            ..Default::default()
        };

        IntegrationSetup::new(&connections, &hooks)
            .run(&plan())
            .await
            .unwrap();

        assert!(hooks.calls().contains(&"replace:who_a".to_string()));
    }

    #[tokio::test]
    async fn test_conflict_without_match_fails() {
        let connections = FakeConnections::returning(Ok(connection(Some(SOURCE_URL))));
        let hooks = FakeHooks {
            create_status: Some(400),
            listed: vec![existing(Some("who_other"), "Something else")],
            ..Default::default()
        };

        let err = IntegrationSetup::new(&connections, &hooks)
            .run(&plan())
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::HookNotFound { .. }));
        assert_eq!(hooks.calls(), vec!["create", "list"]);
    }

    #[tokio::test]
    async fn test_conflict_match_without_id_fails() {
        let connections = FakeConnections::returning(Ok(connection(Some(SOURCE_URL))));
        let hooks = FakeHooks {
            create_status: Some(400),
            listed: vec![existing(None, &plan().hook_name)],
            ..Default::default()
        };

        let err = IntegrationSetup::new(&connections, &hooks)
            .run(&plan())
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::HookMissingId(_)));
    }

    #[tokio::test]
    async fn test_other_create_error_aborts() {
        let connections = FakeConnections::returning(Ok(connection(Some(SOURCE_URL))));
        let hooks = FakeHooks {
            create_status: Some(403),
            ..Default::default()
        };

        let err = IntegrationSetup::new(&connections, &hooks)
            .run(&plan())
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::CreateHook(_)));
        assert_eq!(hooks.calls(), vec!["create"]);
    }

    #[tokio::test]
    async fn test_verification_failure_is_not_fatal() {
        let connections = FakeConnections::returning(Ok(connection(Some(SOURCE_URL))));
        let hooks = FakeHooks {
            verify_fails: true,
            ..Default::default()
        };

        let outcome = IntegrationSetup::new(&connections, &hooks)
            .run(&plan())
            .await
            .unwrap();

        assert_eq!(outcome.event_hook.id.as_deref(), Some("who_new"));
        assert_eq!(outcome.event_hook.status.as_deref(), Some(STATUS_ACTIVE));
        assert!(outcome.event_hook.verification_status.is_none());
    }

    #[tokio::test]
    async fn test_connection_failure_aborts_before_okta() {
        let connections = FakeConnections::returning(Err(status_error(401)));
        let hooks = FakeHooks::default();

        let err = IntegrationSetup::new(&connections, &hooks)
            .run(&plan())
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::Connection(_)));
        assert!(hooks.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_source_url_aborts() {
        let connections = FakeConnections::returning(Ok(connection(None)));
        let hooks = FakeHooks::default();

        let err = IntegrationSetup::new(&connections, &hooks)
            .run(&plan())
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::MissingSourceUrl(_)));
        assert!(hooks.calls().is_empty());
    }

    #[test]
    fn test_summary_rendering() {
        let mut hook = existing(Some("who_1"), "Hookdeck Rust Example Hook - DEV");
        hook.status = None;
        let outcome = SetupOutcome {
            connection: connection(Some(SOURCE_URL)),
            event_hook: hook,
        };

        let summary = outcome.to_string();

        assert!(summary.starts_with("--- Summary ---\n"));
        assert!(summary.contains(&format!("Name: {}, ID: web_1", CONNECTION_NAME)));
        assert!(summary.contains("  - Source: 'okta' (Type: WEBHOOK)"));
        assert!(summary.contains("  - Destination: 'hookdeck-cli' (Type: CLI)"));
        assert!(summary.contains(&format!("Source URL (for Okta): {}", SOURCE_URL)));
        assert!(summary.contains("(ID: who_1, Status: N/A)"));
    }
}
