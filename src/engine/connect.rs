//! Phone-triggered check-in, check-out and emergency handling.
//!
//! Each call resolves the caller to a set of email addresses, searches a
//! role-appropriate time window for appointments the caller attends, picks
//! at most one target (except for emergencies, which tag every plausible
//! match), validates the requested transition and applies it.

use anyhow::Result;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::config::{ConnectConfig, MailCategory, Settings};
use crate::core::metrics::{
    APPOINTMENT_NOT_FOUND, CHECK_INS, CHECK_OUTS, DUPLICATE_CALLS, EMERGENCIES, UNKNOWN_CALLER,
    Metrics,
};
use crate::engine::filter::{Direction, Field, TimeFilter, build_filter};
use crate::engine::tag::Tag;
use crate::engine::{Calendar, Directory, Notifier};
use crate::graph::models::{Appointment, CALENDAR_TIMEZONE, EventPatch};

/// What the caller asked for, selected on the phone menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Action {
    CheckIn,
    CheckOut,
    Emergency,
}

#[derive(Debug, Error)]
#[error("Invalid action selected: {0}")]
pub struct InvalidAction(pub String);

impl Action {
    /// Parse the value sent by the telephony layer: the menu key or the
    /// action name. Anything else is rejected.
    pub fn parse(value: &str) -> Result<Self, InvalidAction> {
        match value {
            "1" | "checkin" | "check-in" => Ok(Action::CheckIn),
            "2" | "checkout" | "check-out" => Ok(Action::CheckOut),
            "3" | "emergency" => Ok(Action::Emergency),
            other => Err(InvalidAction(other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::CheckIn => "Check in",
            Action::CheckOut => "Check out",
            Action::Emergency => "Emergency",
        }
    }

    fn counter(&self) -> &'static str {
        match self {
            Action::CheckIn => CHECK_INS,
            Action::CheckOut => CHECK_OUTS,
            Action::Emergency => EMERGENCIES,
        }
    }
}

/// The user-facing result of a call. Business outcomes like "no matching
/// appointment" are values, not errors; only infrastructure failures
/// propagate as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Full handling of one phone call: caller resolution, the emergency email,
/// then the appointment transition.
pub async fn handle_call<C>(
    client: &C,
    settings: &Settings,
    metrics: &mut Metrics,
    action: Action,
    caller_number: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Outcome>
where
    C: Calendar + Directory + Notifier,
{
    metrics.increment(action.counter());

    let Some(number) = caller_number else {
        tracing::warn!("call arrived without a caller number");
        metrics.increment(UNKNOWN_CALLER);
        return Ok(Outcome::failed(
            "Unable to find your phone number - please phone the office.",
        ));
    };

    let caller = client.resolve(number).await?;
    if caller.addresses.is_empty() {
        tracing::warn!(number, "caller not found in directory");
        metrics.increment(UNKNOWN_CALLER);
        return Ok(Outcome::failed(
            "Unrecognised phone number - please phone the office.",
        ));
    }

    if action == Action::Emergency {
        // The SOS mail goes out before any calendar work.
        let body = format!(
            "Emergency assistance is required for {}, phone number {}.",
            caller.display_name, number
        );
        client
            .send(
                MailCategory::Emergency,
                "Emergency Assistance Required!",
                &body,
            )
            .await?;
    }

    process_action(
        client,
        &settings.connect,
        metrics,
        &caller.addresses,
        action,
        now,
    )
    .await
}

/// Select and transition the caller's appointment(s) for one action.
pub async fn process_action(
    calendar: &dyn Calendar,
    cfg: &ConnectConfig,
    metrics: &mut Metrics,
    addresses: &[String],
    action: Action,
    now: DateTime<Utc>,
) -> Result<Outcome> {
    let candidates = fetch_candidates(calendar, cfg, action, addresses, None, now).await?;
    tracing::info!(count = candidates.len(), ?action, "matching appointments");

    match action {
        Action::CheckIn => {
            check_in(calendar, cfg, metrics, addresses, candidates, now).await
        }
        Action::CheckOut => check_out(calendar, metrics, candidates, now).await,
        Action::Emergency => emergency(calendar, candidates, now).await,
    }
}

/// Fetch appointments in the window for `action` and keep those the caller
/// attends. `end_before` further constrains the window to events ending at
/// or before an explicit instant.
async fn fetch_candidates(
    calendar: &dyn Calendar,
    cfg: &ConnectConfig,
    action: Action,
    addresses: &[String],
    end_before: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Vec<Appointment>> {
    let mut filters = match action {
        // A meeting due to start within the check-in grace either way.
        Action::CheckIn => vec![
            TimeFilter::relative(-cfg.checkin_grace_min, Direction::After, Field::Start),
            TimeFilter::relative(cfg.checkin_grace_min, Direction::Before, Field::Start),
        ],
        // Asymmetric: an early checkout is legitimate, so look well forward
        // on the end time, but only checkout_grace back.
        Action::CheckOut => vec![
            TimeFilter::relative(-cfg.checkout_grace_min, Direction::After, Field::End),
            TimeFilter::relative(cfg.ignore_after_min, Direction::Before, Field::End),
        ],
        // Anything currently plausible.
        Action::Emergency => vec![
            TimeFilter::relative(cfg.ignore_after_min, Direction::Before, Field::Start),
            TimeFilter::relative(-cfg.ignore_after_min, Direction::After, Field::End),
        ],
    };

    if let Some(end_before) = end_before {
        filters.push(TimeFilter::absolute(
            end_before,
            Direction::Before,
            Field::End,
        ));
    }

    let filter = build_filter(&filters, now)?;
    let appointments = calendar.list_events(&filter).await?;

    Ok(appointments
        .into_iter()
        .filter(|a| a.has_attendee(addresses))
        .collect())
}

async fn check_in(
    calendar: &dyn Calendar,
    cfg: &ConnectConfig,
    metrics: &mut Metrics,
    addresses: &[String],
    mut candidates: Vec<Appointment>,
    now: DateTime<Utc>,
) -> Result<Outcome> {
    let mut appointment = match candidates.len() {
        0 => {
            metrics.increment(APPOINTMENT_NOT_FOUND);
            return Ok(Outcome::failed("No matching appointments found."));
        }
        1 => candidates.remove(0),
        // Two overlapping meetings: guessing which one the caller means
        // would be worse than asking them to phone in.
        _ => {
            metrics.increment(APPOINTMENT_NOT_FOUND);
            return Ok(Outcome::failed("Multiple matching appointments found."));
        }
    };

    if appointment.categories.contains(Tag::CheckedOut) {
        return Ok(Outcome::failed(
            "You are trying to check into a meeting that has already been checked out.",
        ));
    }

    if apply_transition(calendar, &mut appointment, Tag::CheckedIn, now).await? {
        metrics.increment(DUPLICATE_CALLS);
        return Ok(Outcome::ok("Your appointment has already been checked in."));
    }

    let mut message = String::from("Your appointment has been checked in.");
    if check_out_earlier_appointment(calendar, cfg, addresses, &appointment, now).await? {
        message.push_str(" An earlier appointment has also been checked out.");
    }
    Ok(Outcome::ok(message))
}

async fn check_out(
    calendar: &dyn Calendar,
    metrics: &mut Metrics,
    mut candidates: Vec<Appointment>,
    now: DateTime<Utc>,
) -> Result<Outcome> {
    if candidates.is_empty() {
        metrics.increment(APPOINTMENT_NOT_FOUND);
        return Ok(Outcome::failed("No matching appointments found."));
    }

    let mut appointment = if candidates.len() == 1 {
        candidates.remove(0)
    } else {
        // An early checkout drags neighbouring meetings into the window.
        // Only a meeting that is checked in and not yet checked out is a
        // real candidate.
        let mut open: Vec<Appointment> = candidates
            .into_iter()
            .filter(|a| {
                a.categories.contains(Tag::CheckedIn) && !a.categories.contains(Tag::CheckedOut)
            })
            .collect();
        match open.len() {
            1 => open.remove(0),
            0 => {
                metrics.increment(APPOINTMENT_NOT_FOUND);
                return Ok(Outcome::failed("No valid appointments found for checkout."));
            }
            _ => {
                metrics.increment(APPOINTMENT_NOT_FOUND);
                return Ok(Outcome::failed("Multiple matching appointments found."));
            }
        }
    };

    if !appointment.categories.contains(Tag::CheckedIn) {
        return Ok(Outcome::failed(
            "You are trying to check out of a meeting that you have not checked into.",
        ));
    }

    if apply_transition(calendar, &mut appointment, Tag::CheckedOut, now).await? {
        metrics.increment(DUPLICATE_CALLS);
        return Ok(Outcome::ok(
            "Your appointment has already been checked out.",
        ));
    }

    Ok(Outcome::ok("Your appointment has been checked out."))
}

async fn emergency(
    calendar: &dyn Calendar,
    candidates: Vec<Appointment>,
    now: DateTime<Utc>,
) -> Result<Outcome> {
    // The emergency notification has already been sent by this point;
    // finding no meeting to tag is not an error.
    if candidates.is_empty() {
        return Ok(Outcome::ok("No matching appointments found."));
    }

    // Tag every plausible meeting; there is nothing to disambiguate when
    // the extra tags are harmless.
    for mut appointment in candidates {
        apply_transition(calendar, &mut appointment, Tag::Emergency, now).await?;
    }
    Ok(Outcome::ok("Emergency appointment updated."))
}

/// Add `tag` to the appointment and patch it, appending an audit note to the
/// body. Returns true (and skips the patch) when the tag was already there.
async fn apply_transition(
    calendar: &dyn Calendar,
    appointment: &mut Appointment,
    tag: Tag,
    now: DateTime<Utc>,
) -> Result<bool> {
    if appointment.categories.add(tag) {
        tracing::info!(subject = %appointment.subject, %tag, "appointment already has category");
        return Ok(true);
    }

    let note = format!(
        "<p>{} by phone at {}</p>\r\n",
        transition_phrase(tag),
        now.format("%Y-%m-%d %H:%M:%S")
    );
    if appointment.body.content.contains("</body>") {
        appointment.body.content = appointment
            .body
            .content
            .replace("</body>", &format!("{}</body>", note));
    } else {
        appointment.body.content.push_str(&note);
    }

    let patch = EventPatch {
        categories: Some(appointment.categories.clone().into_vec()),
        body: Some(appointment.body.clone()),
        ..Default::default()
    };
    calendar.patch_event(&appointment.id, &patch).await?;
    tracing::info!(subject = %appointment.subject, %tag, "appointment updated");
    Ok(false)
}

fn transition_phrase(tag: Tag) -> &'static str {
    match tag {
        Tag::CheckedIn => "Checked in",
        Tag::CheckedOut => "Checked out",
        Tag::Emergency => "Emergency reported",
        // The missed tags are applied by the sweep, which writes its own
        // patch and never goes through here.
        Tag::MissedCheckIn | Tag::MissedCheckOut => "Updated",
    }
}

/// After a fresh check-in, look for one appointment the caller forgot to
/// check out of: it must end at or before the just-confirmed start time and
/// still be open. Anything other than exactly one such appointment means
/// there is nothing to repair.
async fn check_out_earlier_appointment(
    calendar: &dyn Calendar,
    cfg: &ConnectConfig,
    addresses: &[String],
    confirmed: &Appointment,
    now: DateTime<Utc>,
) -> Result<bool> {
    // The confirmed start feeds straight into a filter clause, so it must
    // be in the normalized calendar zone. Seeing another zone points at an
    // upstream data problem; skip the lookup rather than compare
    // incomparable timestamps.
    if confirmed.start.time_zone != CALENDAR_TIMEZONE {
        tracing::warn!(
            zone = %confirmed.start.time_zone,
            "unexpected start timezone, skipping earlier-appointment lookup"
        );
        return Ok(false);
    }

    let mut candidates = fetch_candidates(
        calendar,
        cfg,
        Action::CheckOut,
        addresses,
        Some(&confirmed.start.date_time),
        now,
    )
    .await?;

    if candidates.len() != 1 {
        tracing::info!(count = candidates.len(), "no single earlier appointment to repair");
        return Ok(false);
    }
    let mut earlier = candidates.remove(0);
    if !earlier.categories.contains(Tag::CheckedIn)
        || earlier.categories.contains(Tag::CheckedOut)
    {
        return Ok(false);
    }

    apply_transition(calendar, &mut earlier, Tag::CheckedOut, now).await?;
    Ok(true)
}
