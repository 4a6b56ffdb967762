//! Hookrelay events - export Hookdeck events (or requests) as JSON.
//!
//! Lists records matching the given filters, fetches each record's full detail
//! and writes the result to stdout or a file.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hookrelay::hookdeck::{DateFilters, EventExporter, EventQuery, EventStatus, ExportResource};
use hookrelay::util::build_client;
use hookrelay::{EventsConfig, HookdeckClient};

/// Retrieve events or requests from the Hookdeck API.
#[derive(Debug, Parser)]
#[command(name = "hookrelay-events", version)]
struct Args {
    /// What to export: events or requests
    #[arg(long, default_value = "events")]
    resource: ExportResource,

    /// Filter events by status: SCHEDULED, QUEUED, HOLD, SUCCESSFUL, FAILED
    #[arg(long)]
    status: Option<EventStatus>,

    /// Filter events by destination ID
    #[arg(long)]
    destination_id: Option<String>,

    /// Write JSON output to file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum requests per second
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    rate_limit: u32,

    /// Maximum retry attempts for rate limited requests
    #[arg(long, default_value_t = 5)]
    max_retries: u32,

    /// Filter records created after this date (ISO 8601, e.g. 2024-01-01T00:00:00Z)
    #[arg(long)]
    created_after: Option<String>,

    /// Filter records created before this date (ISO 8601)
    #[arg(long)]
    created_before: Option<String>,

    /// Filter records created from this date onwards (inclusive)
    #[arg(long)]
    created_from: Option<String>,

    /// Filter records created until this date (inclusive)
    #[arg(long)]
    created_until: Option<String>,

    /// Filter records that have a created_at value
    #[arg(long)]
    created_any: bool,

    /// Filter records from the last N days
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    last_days: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean JSON
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{:#}", e), "events_export_failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = EventsConfig::from_env().context("Invalid configuration")?;

    let created_at = DateFilters {
        created_after: args.created_after,
        created_before: args.created_before,
        created_from: args.created_from,
        created_until: args.created_until,
        created_any: args.created_any,
        last_days: args.last_days,
    }
    .into_queries(Utc::now())?;

    let query = EventQuery {
        status: args.status,
        destination_id: args.destination_id,
        created_at,
    };
    query.check_supported(args.resource)?;

    info!(
        resource = %args.resource,
        status = ?query.status.map(|s| s.as_str()),
        destination_id = ?query.destination_id,
        date_filters = query.created_at.len(),
        output = ?args.output,
        rate_limit = args.rate_limit,
        max_retries = args.max_retries,
        "events_export_config"
    );

    let http = build_client(Duration::from_millis(config.request_timeout_ms))
        .context("Failed to create HTTP client")?;
    let client = HookdeckClient::new(http, config.hookdeck_api_url, config.hookdeck_api_key);

    let mut exporter = EventExporter::new(client, args.rate_limit, args.max_retries)
        .with_resource(args.resource);
    let records = exporter
        .export(&query)
        .await
        .context("Failed to fetch from Hookdeck API")?;

    let json = serde_json::to_string_pretty(&records).context("Failed to serialize records")?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write to file {}", path.display()))?;
            info!(
                output = %path.display(),
                resource = %args.resource,
                total_records = records.len(),
                "events_written"
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
