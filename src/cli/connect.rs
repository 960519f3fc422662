use anyhow::Result;
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::AppConfig;
use crate::core::metrics::{CONNECT_METRICS, Metrics};
use crate::engine::connect::{Action, handle_call};
use crate::graph::GraphClient;

pub async fn run(action: Action, number: Option<String>) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let client = GraphClient::connect(&config).await?;

    let mut metrics = Metrics::with_counters(CONNECT_METRICS);
    let outcome = handle_call(
        &client,
        &config.settings,
        &mut metrics,
        action,
        number.as_deref(),
        Utc::now(),
    )
    .await?;
    metrics.emit();

    println!("{}", outcome.message);
    Ok(())
}
