//! Microsoft Graph client for the calendar, mail and directory surfaces.

pub mod auth;
pub mod calendar;
pub mod directory;
pub mod mail;
pub mod models;

use anyhow::Result;
use reqwest::Client;

use crate::core::config::AppConfig;
use crate::core::config::Settings;

/// An authenticated Graph client scoped to the monitored user's mailbox.
/// Built fresh for each request or sweep, so the token never outlives one
/// unit of work.
pub struct GraphClient {
    http: Client,
    token: String,
    base_url: String,
    user: String,
    settings: Settings,
}

impl GraphClient {
    /// Authenticate against the configured tenant and return a ready client.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let http = Client::new();
        let token = auth::fetch_token(&http, config).await?;
        Ok(Self {
            http,
            token,
            base_url: config.graph_base_url.clone(),
            user: config.email_user.clone(),
            settings: config.settings.clone(),
        })
    }

    fn events_url(&self) -> String {
        format!("{}/users/{}/calendar/events", self.base_url, self.user)
    }

    fn mail_url(&self) -> String {
        format!("{}/users/{}/sendMail", self.base_url, self.user)
    }

    fn contacts_url(&self) -> String {
        format!("{}/users/{}/contacts", self.base_url, self.user)
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }
}

#[cfg(test)]
pub(crate) fn test_client(base_url: &str) -> GraphClient {
    GraphClient {
        http: Client::new(),
        token: "token-123".to_string(),
        base_url: base_url.to_string(),
        user: "worker@example.com".to_string(),
        settings: Settings::parse(
            "email_recipients_overdue:\n  - office@example.com\n\
             email_recipients_emergency:\n  - sos@example.com\n",
        )
        .unwrap(),
    }
}
