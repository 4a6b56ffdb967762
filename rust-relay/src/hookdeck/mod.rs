//! Hookdeck API access.
//!
//! - `client`: connection upserts used by the setup flow
//! - `events`: paged, rate-limited event and request export
//! - `types`: request and response shapes

pub mod client;
pub mod events;
pub mod types;

pub use client::{ConnectionApi, HookdeckClient};
pub use events::{
    DateFilters, EventExporter, EventQuery, EventStatus, ExportResource, FilterError,
};
pub use types::{
    Connection, DestinationInput, SourceInput, UpsertConnectionRequest, API_VERSION,
};
