use anyhow::Result;
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::AppConfig;
use crate::core::metrics::{CHECK_METRICS, Metrics};
use crate::engine::check::run_sweep;
use crate::graph::GraphClient;

pub async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let client = GraphClient::connect(&config).await?;

    let mut metrics = Metrics::with_counters(CHECK_METRICS);
    run_sweep(&client, &config.settings.check, &mut metrics, Utc::now()).await?;
    metrics.emit();

    println!("Routine check completed");
    for (name, value) in metrics.snapshot() {
        println!("  {}: {}", name, value);
    }
    Ok(())
}
