//! Wire structures for the Microsoft Graph calendar, mail and directory APIs.

use serde::{Deserialize, Serialize};

use crate::engine::tag::TagSet;

/// Timezone used for all calendar reads. Events coming back in any other
/// zone make timestamp comparisons unsafe.
pub const CALENDAR_TIMEZONE: &str = "Etc/GMT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAddress {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    #[serde(rename = "emailAddress")]
    pub email_address: EmailAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventBody {
    #[serde(rename = "contentType")]
    pub content_type: String,
    #[serde(default)]
    pub content: String,
}

impl Default for EventBody {
    fn default() -> Self {
        Self {
            content_type: "html".to_string(),
            content: String::new(),
        }
    }
}

/// A calendar event as returned by the Graph API. This is a transient local
/// copy; changes are written back as an [`EventPatch`], never by re-sending
/// the whole event.
#[derive(Debug, Clone, Deserialize)]
pub struct Appointment {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "bodyPreview", default)]
    pub body_preview: String,
    #[serde(default)]
    pub body: EventBody,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub categories: TagSet,
}

impl Appointment {
    /// Whether any attendee matches one of the caller's addresses.
    /// Address comparison is case-insensitive.
    pub fn has_attendee(&self, addresses: &[String]) -> bool {
        self.attendees.iter().any(|attendee| {
            let candidate = attendee.email_address.address.to_lowercase();
            addresses.iter().any(|a| a.to_lowercase() == candidate)
        })
    }
}

/// A partial event update. Only fields that are set are serialized, so the
/// patch states exactly which fields changed.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<EventBody>,
}

#[derive(Debug, Deserialize)]
pub struct ListEventsResponse {
    pub value: Vec<Appointment>,
}

/// A caller identity resolved from a phone number. `addresses` may be empty
/// when the number is not known to the directory.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub addresses: Vec<String>,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ContactsResponse {
    pub value: Vec<Contact>,
}

#[derive(Debug, Deserialize)]
pub struct Contact {
    #[serde(rename = "emailAddresses", default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsersResponse {
    pub value: Vec<DirectoryUser>,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryUser {
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}
