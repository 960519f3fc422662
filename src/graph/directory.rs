//! Caller lookup: maps a phone number to email addresses by searching the
//! monitored user's contacts and the tenant's user directory.

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::engine::Directory;
use crate::graph::GraphClient;
use crate::graph::models::{CallerIdentity, ContactsResponse, UsersResponse};

/// A UK number in international format is also matched in national format.
const UK_PREFIX: &str = "+44";

fn phone_filter(number: &str) -> String {
    let mut clauses = vec![format!("mobilePhone eq '{}'", number)];
    if let Some(rest) = number.strip_prefix(UK_PREFIX) {
        clauses.push(format!("mobilePhone eq '0{}'", rest));
    }
    clauses.join(" or ")
}

#[async_trait]
impl Directory for GraphClient {
    async fn resolve(&self, number: &str) -> Result<CallerIdentity> {
        tracing::info!(number, "looking up caller");
        let filter = phone_filter(number);

        let mut addresses = Vec::new();
        let mut display_name = "UNKNOWN".to_string();

        let resp = self
            .http
            .get(self.contacts_url())
            .bearer_auth(&self.token)
            .query(&[("$filter", filter.as_str())])
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Contacts request failed: {}, message: {}", status, text);
        }
        let contacts: ContactsResponse = resp.json().await?;
        for contact in contacts.value {
            for email in contact.email_addresses {
                addresses.push(email.address.to_lowercase());
            }
            if let Some(name) = contact.display_name {
                display_name = name;
            }
        }

        // The user list needs a count and an eventual-consistency header
        // before Graph will accept the filter.
        let resp = self
            .http
            .get(self.users_url())
            .bearer_auth(&self.token)
            .header("ConsistencyLevel", "eventual")
            .query(&[("$filter", filter.as_str()), ("$count", "true")])
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("User list request failed: {}, message: {}", status, text);
        }
        let users: UsersResponse = resp.json().await?;
        for user in users.value {
            if let Some(mail) = user.mail {
                addresses.push(mail.to_lowercase());
            }
            if let Some(name) = user.display_name {
                display_name = name;
            }
        }

        tracing::info!(?addresses, display_name, "caller lookup complete");
        Ok(CallerIdentity {
            addresses,
            display_name,
        })
    }
}
