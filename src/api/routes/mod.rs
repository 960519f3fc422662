//! API routes module

pub mod check;
pub mod connect;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Phone check-in/out routes
        .nest("/connect", connect::router())
        // Missed-check sweep routes
        .nest("/check", check::router())
}
