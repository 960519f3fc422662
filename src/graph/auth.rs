//! Client-credentials authentication against Microsoft Entra.

use anyhow::{Result, bail};
use reqwest::Client;
use serde::Deserialize;

use crate::core::config::AppConfig;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Fetch an app-only access token for the Graph API.
pub async fn fetch_token(http: &Client, config: &AppConfig) -> Result<String> {
    let url = format!(
        "{}/{}/oauth2/v2.0/token",
        config.login_base_url, config.tenant
    );
    tracing::debug!(url, "requesting access token");

    let form = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("grant_type", "client_credentials"),
        ("scope", "https://graph.microsoft.com/.default"),
    ];

    let resp = http.post(&url).form(&form).send().await?;
    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        bail!("Authentication failed: {}, message: {}", status, text);
    }

    let token: TokenResponse = resp.json().await?;
    tracing::info!("authenticated with Microsoft Graph");
    Ok(token.access_token)
}
