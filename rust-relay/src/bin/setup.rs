//! Hookrelay setup - wire Okta event hooks to Hookdeck.
//!
//! This binary:
//! 1. Upserts the Hookdeck connection (Okta source → HTTP or CLI destination)
//! 2. Creates or replaces the Okta event hook pointing at the source URL
//! 3. Asks Okta to verify the hook
//! 4. Prints a summary
//!
//! Safe to re-run: both objects are reconciled by name.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hookrelay::okta::normalize_org_url;
use hookrelay::util::build_client;
use hookrelay::{HookdeckClient, IntegrationSetup, OktaClient, SetupConfig, SetupOutcome, SetupPlan};

#[tokio::main]
async fn main() -> ExitCode {
    if dotenv::dotenv().is_err() {
        eprintln!("No .env file found, loading environment variables from OS.");
    }

    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    match run().await {
        Ok(outcome) => {
            println!();
            println!("{}", outcome);
            println!(
                "After setup, run hookrelay-inbound (with HOOKDECK_WEBHOOK_SECRET set) and 'hookdeck listen' to receive events."
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = format!("{:#}", e), "setup_failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<SetupOutcome> {
    let config = SetupConfig::from_env().context("Invalid configuration")?;
    let org_url = normalize_org_url(&config.okta_domain).context("Invalid configuration")?;

    info!(
        hookdeck_api_url = %config.hookdeck_api_url,
        okta_org_url = %org_url,
        destination_url = ?config.webhook_destination_url,
        "config_loaded"
    );

    let http = build_client(Duration::from_millis(config.request_timeout_ms))
        .context("Failed to create HTTP client")?;

    let hookdeck = HookdeckClient::new(
        http.clone(),
        config.hookdeck_api_url.as_str(),
        config.hookdeck_api_key.as_str(),
    );
    let okta = OktaClient::new(http, org_url, config.okta_api_token.as_str());

    info!(api_version = %hookdeck.api_version(), "setup_using_hookdeck_api");

    let plan = SetupPlan::new(config.webhook_destination_url.as_deref());

    let outcome = IntegrationSetup::new(hookdeck, okta)
        .run(&plan)
        .await
        .context("Setup failed")?;

    Ok(outcome)
}
