//! Background jobs that run on a fixed schedule while the server is up.

mod missed_check;
pub use missed_check::MissedCheck;

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::AppConfig;

/// A job that runs forever at a fixed interval. Implementations handle
/// their own failures; a failed run must not stop the schedule.
#[async_trait]
pub trait PeriodicJob: Debug + Send + Sync + 'static {
    fn interval(&self) -> Duration;

    async fn run_job(&self, config: &AppConfig);
}

/// Spawn the job in its own tokio task and tick it forever.
pub fn spawn_periodic_job<J: PeriodicJob>(config: AppConfig, job: J) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(job.interval());
        loop {
            interval.tick().await;
            tracing::info!(?job, "running periodic job");
            job.run_job(&config).await;
        }
    });
}
