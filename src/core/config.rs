//! Application configuration: identity and secrets from the environment,
//! behavior settings from a YAML file. All validation happens at load time,
//! before any Graph API interaction.

use std::env;
use std::fs;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_LOGIN_URL: &str = "https://login.microsoftonline.com";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub tenant: String,
    pub client_id: String,
    pub client_secret: String,
    /// Mailbox whose calendar holds the appointments.
    pub email_user: String,
    pub graph_base_url: String,
    pub login_base_url: String,
    pub settings: Settings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let tenant = require_env("LONEWORKER_TENANT")?;
        let client_id = require_env("LONEWORKER_CLIENT_ID")?;
        let client_secret = require_env("LONEWORKER_CLIENT_SECRET")?;
        let email_user = require_env("LONEWORKER_EMAIL_USER")?;
        let graph_base_url =
            env::var("LONEWORKER_GRAPH_URL").unwrap_or_else(|_| DEFAULT_GRAPH_URL.to_string());
        let login_base_url =
            env::var("LONEWORKER_LOGIN_URL").unwrap_or_else(|_| DEFAULT_LOGIN_URL.to_string());

        let settings_path = require_env("LONEWORKER_CONFIG")?;
        let settings = Settings::from_file(&settings_path)?;

        tracing::info!(tenant, client_id, email_user, "loaded configuration");

        Ok(Self {
            tenant,
            client_id,
            client_secret,
            email_user,
            graph_base_url,
            login_base_url,
            settings,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("Missing env var {}", name))
}

/// Which configured recipient list an email goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailCategory {
    Overdue,
    Emergency,
}

/// Validated behavior settings.
#[derive(Clone, Debug)]
pub struct Settings {
    pub email_recipients_overdue: Vec<String>,
    pub email_recipients_emergency: Vec<String>,
    pub check: CheckConfig,
    pub connect: ConnectConfig,
}

/// Timing for the scheduled missed check-in/out sweep, in minutes.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    #[serde(default = "default_grace")]
    pub grace_min: i64,
    #[serde(default = "default_ignore_after")]
    pub ignore_after_min: i64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            grace_min: default_grace(),
            ignore_after_min: default_ignore_after(),
        }
    }
}

/// Timing for phone-triggered check-in/out, in minutes.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectConfig {
    #[serde(default = "default_grace")]
    pub checkin_grace_min: i64,
    #[serde(default = "default_grace")]
    pub checkout_grace_min: i64,
    #[serde(default = "default_ignore_after")]
    pub ignore_after_min: i64,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            checkin_grace_min: default_grace(),
            checkout_grace_min: default_grace(),
            ignore_after_min: default_ignore_after(),
        }
    }
}

fn default_grace() -> i64 {
    15
}

fn default_ignore_after() -> i64 {
    75
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default)]
    email_recipients_overdue: Option<Vec<String>>,
    #[serde(default)]
    email_recipients_emergency: Option<Vec<String>>,
    #[serde(default)]
    check: Option<CheckConfig>,
    #[serde(default)]
    connect: Option<ConnectConfig>,
}

impl Settings {
    pub fn from_file(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawSettings =
            serde_yaml::from_str(text).context("Configuration validation error")?;

        // One recipient list may stand in for the other, but at least one
        // must be present.
        let (overdue, emergency) = match (
            raw.email_recipients_overdue,
            raw.email_recipients_emergency,
        ) {
            (Some(overdue), Some(emergency)) => (overdue, emergency),
            (Some(overdue), None) => (overdue.clone(), overdue),
            (None, Some(emergency)) => (emergency.clone(), emergency),
            (None, None) => {
                bail!(
                    "At least one of email_recipients_overdue and \
                     email_recipients_emergency must be set"
                )
            }
        };
        if overdue.is_empty() || emergency.is_empty() {
            bail!("Email recipient lists must not be empty");
        }

        let check = raw.check.unwrap_or_default();
        let connect = raw.connect.unwrap_or_default();

        for (name, value) in [
            ("check.grace_min", check.grace_min),
            ("check.ignore_after_min", check.ignore_after_min),
            ("connect.checkin_grace_min", connect.checkin_grace_min),
            ("connect.checkout_grace_min", connect.checkout_grace_min),
            ("connect.ignore_after_min", connect.ignore_after_min),
        ] {
            if value < 0 {
                bail!(
                    "Configuration value {} must be non-negative, got {}",
                    name,
                    value
                );
            }
        }

        Ok(Self {
            email_recipients_overdue: overdue,
            email_recipients_emergency: emergency,
            check,
            connect,
        })
    }

    pub fn recipients(&self, category: MailCategory) -> &[String] {
        match category {
            MailCategory::Overdue => &self.email_recipients_overdue,
            MailCategory::Emergency => &self.email_recipients_emergency,
        }
    }
}
