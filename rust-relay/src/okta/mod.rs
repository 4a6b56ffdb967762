//! Okta event hook management.

pub mod client;
pub mod types;

pub use client::{normalize_org_url, EventHookApi, OktaClient};
pub use types::{AuthScheme, EventHook, EventHookChannel, EventSubscriptions, STATUS_ACTIVE};
