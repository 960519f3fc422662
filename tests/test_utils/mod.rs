//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};

use loneworker::api::AppState;
use loneworker::api::app;
use loneworker::core::AppConfig;
use loneworker::core::config::Settings;

/// Creates a test application router whose Graph and login endpoints point
/// at a mock server.
pub fn test_app(graph_url: &str, login_url: &str) -> Router {
    let settings = Settings::parse(
        "email_recipients_overdue:\n  - office@example.com\n\
         email_recipients_emergency:\n  - sos@example.com\n",
    )
    .expect("Failed to parse test settings");

    let app_config = AppConfig {
        tenant: String::from("test-tenant"),
        client_id: String::from("test-client-id"),
        client_secret: String::from("test-client-secret"),
        email_user: String::from("worker@example.com"),
        graph_base_url: graph_url.to_string(),
        login_base_url: login_url.to_string(),
        settings,
    };
    let app_state = AppState::new(app_config);
    app(Arc::new(RwLock::new(app_state)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("Response body was not utf-8")
}

/// Mock the token endpoint that every authenticated request goes through.
pub async fn mock_token(server: &mut mockito::Server) -> mockito::Mock {
    server
        .mock("POST", "/test-tenant/oauth2/v2.0/token")
        .with_status(200)
        .with_body(r#"{"access_token": "token-123", "token_type": "Bearer"}"#)
        .create_async()
        .await
}
