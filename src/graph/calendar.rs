//! Calendar reads and patches for the monitored user.

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::engine::Calendar;
use crate::graph::GraphClient;
use crate::graph::models::{Appointment, EventPatch, ListEventsResponse};

/// All reads ask for event times in the normalized calendar zone so that
/// timestamps can be compared and fed back into filters.
const PREFER_TIMEZONE: &str = "outlook.timezone=\"Etc/GMT\"";

#[async_trait]
impl Calendar for GraphClient {
    async fn list_events(&self, filter: &str) -> Result<Vec<Appointment>> {
        tracing::info!(filter, "reading calendar events");
        let resp = self
            .http
            .get(self.events_url())
            .bearer_auth(&self.token)
            .header("Prefer", PREFER_TIMEZONE)
            .query(&[("$filter", filter)])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Calendar operation failed: {}, message: {}", status, text);
        }

        let events: ListEventsResponse = resp.json().await?;
        tracing::info!(count = events.value.len(), "got appointments");
        Ok(events.value)
    }

    async fn patch_event(&self, event_id: &str, patch: &EventPatch) -> Result<()> {
        tracing::info!(event_id, categories = ?patch.categories, "updating calendar event");
        let resp = self
            .http
            .patch(format!("{}/{}", self.events_url(), event_id))
            .bearer_auth(&self.token)
            .header("Prefer", PREFER_TIMEZONE)
            .json(patch)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!(
                "Calendar patch operation failed: {}, message: {}",
                status,
                text
            );
        }
        Ok(())
    }
}
