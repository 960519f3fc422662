//! Warning and emergency email via the Graph sendMail endpoint.

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::json;

use crate::core::config::MailCategory;
use crate::engine::Notifier;
use crate::graph::GraphClient;

#[async_trait]
impl Notifier for GraphClient {
    async fn send(&self, category: MailCategory, subject: &str, body: &str) -> Result<()> {
        let recipients = self.settings.recipients(category);
        tracing::info!(?recipients, subject, "sending email");

        let to_recipients: Vec<_> = recipients
            .iter()
            .map(|address| json!({"emailAddress": {"address": address}}))
            .collect();
        let payload = json!({
            "message": {
                "subject": subject,
                "body": {
                    "contentType": "Text",
                    "content": body,
                },
                "toRecipients": to_recipients,
            }
        });

        let resp = self
            .http
            .post(self.mail_url())
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        // sendMail normally returns 202 with an empty body.
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Error sending mail: {}, message: {}", status, text);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_client;

    #[tokio::test]
    async fn test_send_targets_category_recipients() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/users/worker@example.com/sendMail")
            .match_body(mockito::Matcher::Json(json!({
                "message": {
                    "subject": "Emergency Assistance Required!",
                    "body": {"contentType": "Text", "content": "Help needed"},
                    "toRecipients": [{"emailAddress": {"address": "sos@example.com"}}]
                }
            })))
            .with_status(202)
            .create_async()
            .await;

        let client = test_client(&server.url());
        client
            .send(
                MailCategory::Emergency,
                "Emergency Assistance Required!",
                "Help needed",
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_failure_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/users/worker@example.com/sendMail")
            .with_status(500)
            .with_body("mailbox unavailable")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .send(MailCategory::Overdue, "Missed check-in", "details")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Error sending mail"));
    }
}
