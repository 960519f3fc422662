//! The appointment-matching and state-transition engines, plus the seams to
//! the external services they depend on.

pub mod check;
pub mod connect;
pub mod filter;
pub mod tag;

use anyhow::Result;
use async_trait::async_trait;

use crate::core::config::MailCategory;
use crate::graph::models::{Appointment, CallerIdentity, EventPatch};

/// Read and patch access to the appointment calendar.
#[async_trait]
pub trait Calendar: Send + Sync {
    async fn list_events(&self, filter: &str) -> Result<Vec<Appointment>>;
    async fn patch_event(&self, event_id: &str, patch: &EventPatch) -> Result<()>;
}

/// Resolves a caller's phone number to their email addresses.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn resolve(&self, number: &str) -> Result<CallerIdentity>;
}

/// Sends notification email to a configured recipient list.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, category: MailCategory, subject: &str, body: &str) -> Result<()>;
}
