//! Small helpers shared by the API clients.

pub mod http;

pub use http::{build_client, execute, send_json, RawResponse, USER_AGENT};
