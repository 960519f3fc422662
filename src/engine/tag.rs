//! Calendar category tags that encode the check-in state of an appointment.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The category labels this system owns on a calendar event. Tags are only
/// ever added, never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    CheckedIn,
    CheckedOut,
    MissedCheckIn,
    MissedCheckOut,
    Emergency,
}

impl Tag {
    /// The category string as it appears on the calendar event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::CheckedIn => "Checked-In",
            Tag::CheckedOut => "Checked-Out",
            Tag::MissedCheckIn => "Missed-Check-In",
            Tag::MissedCheckOut => "Missed-Check-Out",
            Tag::Emergency => "Emergency",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event's category list treated as an append-only set.
///
/// Categories the system does not know about (set by hand in the calendar
/// UI) are preserved in their original order so a patch never clobbers them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new(categories: Vec<String>) -> Self {
        Self(categories)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.0.iter().any(|c| c == tag.as_str())
    }

    /// Add the tag unless it is already there. Returns whether the tag was
    /// already present.
    pub fn add(&mut self, tag: Tag) -> bool {
        if self.contains(tag) {
            return true;
        }
        self.0.push(tag.as_str().to_string());
        false
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}
