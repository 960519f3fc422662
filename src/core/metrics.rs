//! Process-local invocation counters. Counters accumulate for the duration
//! of one invocation and are flushed to the log once at the end; they are
//! best-effort telemetry, not a source of truth.

use std::collections::BTreeMap;

pub const CHECK_INS: &str = "CheckIns";
pub const CHECK_OUTS: &str = "CheckOuts";
pub const EMERGENCIES: &str = "Emergencies";
pub const UNKNOWN_CALLER: &str = "UnknownCaller";
pub const APPOINTMENT_NOT_FOUND: &str = "AppointmentNotFound";
pub const DUPLICATE_CALLS: &str = "DuplicateCalls";
pub const MEETINGS_CHECKED: &str = "MeetingsChecked";
pub const CHECKINS_MISSED: &str = "CheckinsMissed";
pub const CHECKOUTS_MISSED: &str = "CheckoutsMissed";

/// Counters reported by a phone call invocation.
pub const CONNECT_METRICS: &[&str] = &[
    CHECK_INS,
    CHECK_OUTS,
    EMERGENCIES,
    UNKNOWN_CALLER,
    APPOINTMENT_NOT_FOUND,
    DUPLICATE_CALLS,
];

/// Counters reported by a sweep invocation.
pub const CHECK_METRICS: &[&str] = &[MEETINGS_CHECKED, CHECKINS_MISSED, CHECKOUTS_MISSED];

#[derive(Debug, Clone, Default)]
pub struct Metrics {
    counters: BTreeMap<&'static str, i64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the named counters at zero so every one of them is reported
    /// even when nothing happened.
    pub fn with_counters(names: &[&'static str]) -> Self {
        Self {
            counters: names.iter().map(|name| (*name, 0)).collect(),
        }
    }

    pub fn increment(&mut self, name: &'static str) {
        self.increment_by(name, 1);
    }

    pub fn increment_by(&mut self, name: &'static str, amount: i64) {
        *self.counters.entry(name).or_insert(0) += amount;
    }

    pub fn get(&self, name: &str) -> i64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Owned copy suitable for serializing into a response.
    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        self.counters
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    /// Flush the counters to the log. Called once per invocation.
    pub fn emit(&self) {
        tracing::info!(counters = ?self.counters, "invocation metrics");
    }
}
