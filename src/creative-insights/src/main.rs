//! CreativeInsights: batch reporting on ad performance by creative asset.
//!
//! Parameterless entry point: configuration comes from the environment, the
//! breakdown set and date preset default to the production values, and any
//! fatal error terminates the process with a non-zero status.

use anyhow::Context;
use chrono::Local;
use creative_insights::pipeline::Pipeline;
use insights_core::config::AppConfig;
use insights_platform::{Credentials, GraphClient};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "creative_insights=info,insights_platform=info,insights_reporting=info,insights_charts=info".into()
            }),
        )
        .init();

    info!("CreativeInsights starting up");

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let credentials = Credentials::from_env().context("loading Graph credentials")?;
    let client = GraphClient::new(credentials, config.fetch.statuses.clone())?;

    let pipeline = Pipeline::new(client, config);
    let layout = pipeline.run(Local::now())?;

    info!(output = %layout.root().display(), "run complete");
    Ok(())
}
