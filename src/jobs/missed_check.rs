use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::PeriodicJob;
use crate::core::AppConfig;
use crate::core::metrics::{CHECK_METRICS, Metrics};
use crate::engine::check::run_sweep;
use crate::graph::GraphClient;

/// Sweeps the calendar for missed check-ins and check-outs.
#[derive(Debug)]
pub struct MissedCheck;

#[async_trait]
impl PeriodicJob for MissedCheck {
    fn interval(&self) -> Duration {
        // The sweep window has 15 minutes of grace, so running every 15
        // minutes means nothing can slip through between runs.
        Duration::from_secs(60 * 15)
    }

    async fn run_job(&self, config: &AppConfig) {
        let client = match GraphClient::connect(config).await {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("Failed to authenticate for missed-check sweep: {:#}", e);
                return;
            }
        };

        let mut metrics = Metrics::with_counters(CHECK_METRICS);
        if let Err(e) = run_sweep(&client, &config.settings.check, &mut metrics, Utc::now()).await {
            tracing::error!("Missed-check sweep failed: {:#}", e);
            return;
        }
        metrics.emit();
    }
}
