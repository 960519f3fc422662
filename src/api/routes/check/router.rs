//! Router for the missed-check sweep API

use std::sync::{Arc, RwLock};

use axum::{Router, extract::State, response::Json};
use chrono::Utc;

use super::public;
use crate::api::state::AppState;
use crate::core::metrics::{CHECK_METRICS, Metrics};
use crate::engine::check::run_sweep;
use crate::graph::GraphClient;

type SharedState = Arc<RwLock<AppState>>;

async fn check_handler(
    State(state): State<SharedState>,
) -> Result<Json<public::CheckResponse>, crate::api::public::ApiError> {
    let config = {
        let shared_state = state.read().expect("Unable to read shared state");
        shared_state.config.clone()
    };

    let client = GraphClient::connect(&config).await?;
    let mut metrics = Metrics::with_counters(CHECK_METRICS);
    run_sweep(&client, &config.settings.check, &mut metrics, Utc::now()).await?;
    metrics.emit();

    Ok(Json(public::CheckResponse {
        message: "Routine check completed".to_string(),
        metrics: metrics.snapshot(),
    }))
}

/// Create the check router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", axum::routing::post(check_handler))
}
