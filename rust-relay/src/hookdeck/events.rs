//! Bulk export: page through `/events` (or `/requests`) and fetch each
//! record's detail.
//!
//! Unlike the setup flow this is a bulk reader, so it spaces its requests and
//! retries HTTP 429 responses.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::hookdeck::client::HookdeckClient;
use crate::hookdeck::types::Page;
use crate::util::http::{execute, RawResponse};

/// Invalid export filters.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("invalid status '{0}'. Valid values are: SCHEDULED, QUEUED, HOLD, SUCCESSFUL, FAILED")]
    InvalidStatus(String),

    #[error("invalid {flag} '{value}'. Please use ISO 8601 format (e.g., 2024-01-01T00:00:00Z or 2024-01-01)")]
    InvalidDate { flag: &'static str, value: String },

    #[error("--last-days cannot be used with other date filters (--created-after, --created-before, --created-from, --created-until, --created-any)")]
    ConflictingDateFilters,

    #[error("invalid last-days '{0}'. Must be a positive number.")]
    InvalidLastDays(u32),

    #[error("last-days '{0}' reaches too far back")]
    LastDaysOutOfRange(u32),

    #[error("invalid resource '{0}'. Valid values are: events, requests")]
    InvalidResource(String),

    #[error("{filter} only applies to events, not {resource}")]
    UnsupportedFilter {
        filter: &'static str,
        resource: ExportResource,
    },
}

/// What to export. Requests are the raw inbound deliveries, events are the
/// per-destination attempts derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportResource {
    #[default]
    Events,
    Requests,
}

impl ExportResource {
    /// API path segment, also used as the plural label in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportResource::Events => "events",
            ExportResource::Requests => "requests",
        }
    }
}

impl FromStr for ExportResource {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "events" | "event" => Ok(ExportResource::Events),
            "requests" | "request" => Ok(ExportResource::Requests),
            _ => Err(FilterError::InvalidResource(s.to_string())),
        }
    }
}

impl fmt::Display for ExportResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery status of a Hookdeck event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Scheduled,
    Queued,
    Hold,
    Successful,
    Failed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "SCHEDULED",
            EventStatus::Queued => "QUEUED",
            EventStatus::Hold => "HOLD",
            EventStatus::Successful => "SUCCESSFUL",
            EventStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for EventStatus {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => Ok(EventStatus::Scheduled),
            "QUEUED" => Ok(EventStatus::Queued),
            "HOLD" => Ok(EventStatus::Hold),
            "SUCCESSFUL" => Ok(EventStatus::Successful),
            "FAILED" => Ok(EventStatus::Failed),
            _ => Err(FilterError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied to `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOperator {
    Gt,
    Gte,
    Lt,
    Lte,
    /// Any non-null value.
    Any,
}

impl DateOperator {
    fn as_str(&self) -> &'static str {
        match self {
            DateOperator::Gt => "gt",
            DateOperator::Gte => "gte",
            DateOperator::Lt => "lt",
            DateOperator::Lte => "lte",
            DateOperator::Any => "any",
        }
    }
}

/// One `created_at[op]=value` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateQuery {
    pub operator: DateOperator,
    pub value: Option<DateTime<Utc>>,
}

impl DateQuery {
    fn query_pair(&self) -> (String, String) {
        let key = format!("created_at[{}]", self.operator.as_str());
        let value = self
            .value
            .map(|v| v.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default();
        (key, value)
    }
}

/// Raw date filters as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct DateFilters {
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub created_from: Option<String>,
    pub created_until: Option<String>,
    pub created_any: bool,
    pub last_days: Option<u32>,
}

impl DateFilters {
    /// Validate and convert to `created_at` queries. `now` anchors `last_days`.
    pub fn into_queries(self, now: DateTime<Utc>) -> Result<Vec<DateQuery>, FilterError> {
        if let Some(days) = self.last_days {
            if days == 0 {
                return Err(FilterError::InvalidLastDays(days));
            }
            let explicit = self.created_after.is_some()
                || self.created_before.is_some()
                || self.created_from.is_some()
                || self.created_until.is_some()
                || self.created_any;
            if explicit {
                return Err(FilterError::ConflictingDateFilters);
            }
            let since = TimeDelta::try_days(i64::from(days))
                .and_then(|span| now.checked_sub_signed(span))
                .ok_or(FilterError::LastDaysOutOfRange(days))?;
            return Ok(vec![DateQuery {
                operator: DateOperator::Gte,
                value: Some(since),
            }]);
        }

        let mut queries = Vec::new();
        let explicit = [
            (self.created_after, DateOperator::Gt, "--created-after"),
            (self.created_before, DateOperator::Lt, "--created-before"),
            (self.created_from, DateOperator::Gte, "--created-from"),
            (self.created_until, DateOperator::Lte, "--created-until"),
        ];
        for (raw, operator, flag) in explicit {
            if let Some(raw) = raw {
                queries.push(DateQuery {
                    operator,
                    value: Some(parse_date(&raw, flag)?),
                });
            }
        }
        if self.created_any {
            queries.push(DateQuery {
                operator: DateOperator::Any,
                value: None,
            });
        }

        Ok(queries)
    }
}

/// Parse RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a bare date.
pub fn parse_date(raw: &str, flag: &'static str) -> Result<DateTime<Utc>, FilterError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    Err(FilterError::InvalidDate {
        flag,
        value: raw.to_string(),
    })
}

/// Filters for the `/events` listing.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub status: Option<EventStatus>,
    pub destination_id: Option<String>,
    pub created_at: Vec<DateQuery>,
}

impl EventQuery {
    /// Query string pairs, in a stable order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(id) = &self.destination_id {
            pairs.push(("destination_id".to_string(), id.clone()));
        }
        pairs.extend(self.created_at.iter().map(DateQuery::query_pair));
        pairs
    }

    /// Reject filters the listing for `resource` does not understand.
    pub fn check_supported(&self, resource: ExportResource) -> Result<(), FilterError> {
        if resource == ExportResource::Events {
            return Ok(());
        }
        if self.status.is_some() {
            return Err(FilterError::UnsupportedFilter {
                filter: "--status",
                resource,
            });
        }
        if self.destination_id.is_some() {
            return Err(FilterError::UnsupportedFilter {
                filter: "--destination-id",
                resource,
            });
        }
        Ok(())
    }
}

/// Rate-limited, retrying reader over a Hookdeck list endpoint.
pub struct EventExporter {
    client: HookdeckClient,
    resource: ExportResource,
    min_interval: Duration,
    max_retries: u32,
    last_request: Option<Instant>,
}

impl EventExporter {
    /// Export events. `requests_per_second` must be positive.
    pub fn new(client: HookdeckClient, requests_per_second: u32, max_retries: u32) -> Self {
        let rps = requests_per_second.max(1);
        Self {
            client,
            resource: ExportResource::Events,
            min_interval: Duration::from_secs_f64(1.0 / f64::from(rps)),
            max_retries,
            last_request: None,
        }
    }

    /// Switch to another list endpoint.
    pub fn with_resource(mut self, resource: ExportResource) -> Self {
        self.resource = resource;
        self
    }

    pub fn resource(&self) -> ExportResource {
        self.resource
    }

    /// List every record matching `query`, then replace each summary with its
    /// full detail. A failed detail fetch keeps the summary.
    pub async fn export(
        &mut self,
        query: &EventQuery,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        let resource = self.resource;
        let summaries = self.list_all(query).await?;

        info!(
            resource = %resource,
            record_count = summaries.len(),
            "export_detail_fetch_starting"
        );

        let mut detailed = Vec::with_capacity(summaries.len());
        for (index, summary) in summaries.into_iter().enumerate() {
            let id = match summary.get("id").and_then(|v| v.as_str()) {
                Some(id) => id.to_string(),
                None => {
                    warn!(resource = %resource, index = index, "export_summary_missing_id");
                    detailed.push(summary);
                    continue;
                }
            };

            info!(
                resource = %resource,
                index = index + 1,
                record_id = %id,
                "export_detail_fetching"
            );

            match self.get_detail(&id).await {
                Ok(record) => detailed.push(record),
                Err(e) => {
                    warn!(
                        resource = %resource,
                        record_id = %id,
                        error = %e,
                        "export_detail_fetch_failed"
                    );
                    detailed.push(summary);
                }
            }
        }

        info!(
            resource = %resource,
            record_count = detailed.len(),
            "export_detail_fetch_complete"
        );

        Ok(detailed)
    }

    /// Follow `pagination.next` until the listing is exhausted.
    pub async fn list_all(
        &mut self,
        query: &EventQuery,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        let resource = self.resource;
        let base_pairs = query.query_pairs();
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page_count = 0u32;

        loop {
            page_count += 1;
            let mut pairs = base_pairs.clone();
            if let Some(next) = &cursor {
                pairs.push(("next".to_string(), next.clone()));
            }
            let url = with_query(&self.client.endpoint(resource.as_str()), &pairs);

            info!(resource = %resource, page = page_count, "export_page_fetching");

            let page: Page = self.get_with_retry(&url).await?.json()?;
            let page_len = page.models.len();
            records.extend(page.models);

            info!(
                resource = %resource,
                page = page_count,
                page_records = page_len,
                total_records = records.len(),
                reported_count = ?page.count,
                "export_page_fetched"
            );

            match page.pagination.next.filter(|n| !n.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(
            resource = %resource,
            pages = page_count,
            total_records = records.len(),
            "export_listing_complete"
        );

        Ok(records)
    }

    /// Fetch one record with its payload data.
    pub async fn get_detail(&mut self, id: &str) -> Result<serde_json::Value, ApiError> {
        let url = self
            .client
            .endpoint(&format!("{}/{}", self.resource.as_str(), id));
        self.get_with_retry(&url).await?.json()
    }

    async fn get_with_retry(&mut self, url: &str) -> Result<RawResponse, ApiError> {
        let mut attempt = 0u32;

        loop {
            self.throttle().await;

            let response = execute(
                self.client.request(Method::GET, url),
                Method::GET,
                url,
            )
            .await?;

            if response.status != StatusCode::TOO_MANY_REQUESTS {
                return response.error_for_status();
            }

            if attempt >= self.max_retries {
                return Err(ApiError::RateLimited {
                    url: url.to_string(),
                    retries: self.max_retries,
                });
            }

            let backoff = retry_after(&response).unwrap_or_else(|| backoff_for(attempt));
            warn!(
                url = %url,
                attempt = attempt + 1,
                max_retries = self.max_retries,
                backoff_seconds = backoff.as_secs_f64(),
                "hookdeck_rate_limited"
            );
            sleep(backoff).await;
            attempt += 1;
        }
    }

    async fn throttle(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// Exponential backoff: 1s, 2s, 4s, 8s, ...
fn backoff_for(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(16))
}

/// `Retry-After` in whole seconds, if present.
fn retry_after(response: &RawResponse) -> Option<Duration> {
    response
        .headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn with_query(base: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return base.to_string();
    }
    match url::Url::parse(base) {
        Ok(mut url) => {
            url.query_pairs_mut().extend_pairs(pairs.iter());
            url.to_string()
        }
        Err(_) => base.to_string(),
    }
}
