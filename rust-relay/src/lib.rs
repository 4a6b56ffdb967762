//! Hookrelay - Hookdeck webhook tooling.
//!
//! This library provides shared modules for the three hookrelay binaries:
//! - `hookrelay-inbound`: Webhook receiver with Hookdeck signature verification
//! - `hookrelay-setup`: One-shot Okta → Hookdeck integration setup
//! - `hookrelay-events`: Hookdeck event export
//!
//! ## Architecture
//!
//! ```text
//! Okta event hook → Hookdeck source → connection → destination → hookrelay-inbound
//! ```

pub mod config;
pub mod error;
pub mod hookdeck;
pub mod okta;
pub mod setup;
pub mod util;
pub mod web;

// Re-export commonly used types
pub use config::{EventsConfig, ReceiverConfig, SetupConfig};
pub use error::{ApiError, ConfigError, SetupError};
pub use hookdeck::{ConnectionApi, HookdeckClient};
pub use okta::{EventHookApi, OktaClient};
pub use setup::{IntegrationSetup, SetupOutcome, SetupPlan};
pub use web::{AppState, SignatureVerifier};
