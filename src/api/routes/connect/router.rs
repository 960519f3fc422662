//! Router for the phone connect API

use std::sync::{Arc, RwLock};

use axum::response::IntoResponse;
use axum::{Router, extract::State, response::Json, response::Response};
use chrono::Utc;
use http::StatusCode;

use super::public;
use crate::api::state::AppState;
use crate::core::metrics::{CONNECT_METRICS, Metrics};
use crate::engine::connect::{Action, handle_call};
use crate::graph::GraphClient;

type SharedState = Arc<RwLock<AppState>>;

async fn connect_handler(
    State(state): State<SharedState>,
    Json(req): Json<public::ConnectRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let action = match Action::parse(&req.action) {
        Ok(action) => action,
        Err(err) => {
            tracing::warn!(action = %req.action, "rejecting unrecognised action");
            return Ok((StatusCode::BAD_REQUEST, err.to_string()).into_response());
        }
    };

    let config = {
        let shared_state = state.read().expect("Unable to read shared state");
        shared_state.config.clone()
    };

    let client = GraphClient::connect(&config).await?;
    let mut metrics = Metrics::with_counters(CONNECT_METRICS);
    let outcome = handle_call(
        &client,
        &config.settings,
        &mut metrics,
        action,
        req.caller_number.as_deref(),
        Utc::now(),
    )
    .await?;
    metrics.emit();

    Ok(Json(public::ConnectResponse {
        success: outcome.success,
        message: outcome.message,
        action: action.label().to_string(),
        calling_number: req.caller_number,
        metrics: metrics.snapshot(),
    })
    .into_response())
}

/// Create the connect router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", axum::routing::post(connect_handler))
}
