//! kinship-daily - the scheduler-invoked daily pipeline run.
//!
//! Invoked by an external scheduler (cron) with no arguments. All
//! configuration comes from the environment; the structured run summary is
//! printed to stdout as JSON. Fatal errors (missing configuration, store
//! connectivity) exit non-zero so the scheduler can alert.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kinship_db::Database;
use kinship_inference::ChatBackend;
use kinship_jobs::{BatchConfig, DailyCheck, PipelineStore};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "Daily check failed");
        eprintln!("Error running daily check: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    //
    // Environment variables:
    //   RUST_LOG    - standard env filter (default: "kinship=info")
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kinship=info,kinship_jobs=info,kinship_db=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL is required")?;

    let db = Database::connect(&database_url)
        .await
        .context("failed to connect to database")?;

    if std::env::var("KINSHIP_MIGRATE_ON_START")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
    {
        info!("Running pending migrations");
        db.migrate().await.context("migrations failed")?;
    }

    let config = BatchConfig::from_env();
    let backend = ChatBackend::from_env().context("failed to build suggestion backend")?;

    let check = DailyCheck::new(
        PipelineStore::from_database(&db),
        Arc::new(backend),
        config,
    );

    let summary = check
        .run(Utc::now())
        .await
        .context("daily check run failed")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
