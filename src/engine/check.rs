//! Scheduled sweep for appointments that were never checked in or out of.
//!
//! The sweep looks back over a sliding window: events whose start (or end)
//! fell between `ignore_after_min` and `grace_min` minutes ago. An event
//! missing the expected tag gets a warning email to the overdue recipients,
//! a missed tag and a subject prefix so it stands out in the calendar.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::core::config::{CheckConfig, MailCategory};
use crate::core::metrics::{CHECKINS_MISSED, CHECKOUTS_MISSED, MEETINGS_CHECKED, Metrics};
use crate::engine::filter::{Direction, Field, TimeFilter, build_filter};
use crate::engine::tag::Tag;
use crate::engine::{Calendar, Notifier};
use crate::graph::models::{Appointment, EventPatch};

/// Which half of the sweep is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepKind {
    CheckIn,
    CheckOut,
}

impl SweepKind {
    fn field(&self) -> Field {
        match self {
            SweepKind::CheckIn => Field::Start,
            SweepKind::CheckOut => Field::End,
        }
    }

    /// The tag whose presence means all is well.
    fn done_tag(&self) -> Tag {
        match self {
            SweepKind::CheckIn => Tag::CheckedIn,
            SweepKind::CheckOut => Tag::CheckedOut,
        }
    }

    fn missed_tag(&self) -> Tag {
        match self {
            SweepKind::CheckIn => Tag::MissedCheckIn,
            SweepKind::CheckOut => Tag::MissedCheckOut,
        }
    }

    fn counter(&self) -> &'static str {
        match self {
            SweepKind::CheckIn => CHECKINS_MISSED,
            SweepKind::CheckOut => CHECKOUTS_MISSED,
        }
    }

    fn mail_subject(&self) -> &'static str {
        match self {
            SweepKind::CheckIn => "Missed check-in",
            SweepKind::CheckOut => "Missed check-out",
        }
    }

    fn mail_headline(&self) -> &'static str {
        match self {
            SweepKind::CheckIn => "Check-in was missed for an appointment",
            SweepKind::CheckOut => "Check-out was missed for an appointment",
        }
    }
}

/// Run both halves of the sweep against the calendar.
pub async fn run_sweep<C>(
    client: &C,
    cfg: &CheckConfig,
    metrics: &mut Metrics,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: Calendar + Notifier,
{
    for kind in [SweepKind::CheckIn, SweepKind::CheckOut] {
        let appointments = fetch_overdue(client, cfg, kind, now).await?;
        tracing::info!(?kind, count = appointments.len(), "sweeping appointments");
        process_appointments(client, metrics, kind, appointments).await;
    }
    Ok(())
}

/// Events whose start or end fell inside the overdue window.
async fn fetch_overdue(
    calendar: &dyn Calendar,
    cfg: &CheckConfig,
    kind: SweepKind,
    now: DateTime<Utc>,
) -> Result<Vec<Appointment>> {
    let field = kind.field();
    let filters = [
        TimeFilter::relative(-cfg.ignore_after_min, Direction::After, field),
        TimeFilter::relative(-cfg.grace_min, Direction::Before, field),
    ];
    let filter = build_filter(&filters, now)?;
    calendar.list_events(&filter).await
}

/// Flag every appointment in the batch that missed its transition. One bad
/// appointment must not stop the rest of the batch, so failures are logged
/// and the loop continues.
async fn process_appointments<C>(
    client: &C,
    metrics: &mut Metrics,
    kind: SweepKind,
    appointments: Vec<Appointment>,
) where
    C: Calendar + Notifier,
{
    metrics.increment_by(MEETINGS_CHECKED, appointments.len() as i64);

    for appointment in appointments {
        tracing::info!(
            start = %appointment.start.date_time,
            zone = %appointment.start.time_zone,
            subject = %appointment.subject,
            "checking appointment"
        );

        if appointment.categories.contains(kind.done_tag()) {
            continue;
        }
        if appointment.categories.contains(kind.missed_tag()) {
            continue;
        }
        // A meeting nobody checked into gets flagged by the check-in half
        // alone; a missed checkout on top of it is just noise.
        if kind == SweepKind::CheckOut && !appointment.categories.contains(Tag::CheckedIn) {
            continue;
        }
        if appointment.attendees.is_empty() {
            tracing::debug!(subject = %appointment.subject, "no attendees, ignoring");
            continue;
        }

        tracing::warn!(subject = %appointment.subject, ?kind, "missed transition");
        match flag_appointment(client, kind, appointment).await {
            Ok(()) => metrics.increment(kind.counter()),
            Err(err) => tracing::error!(error = %format!("{err:#}"), "failed to flag appointment"),
        }
    }
}

/// Warn the overdue recipients, then mark the event. The mail goes first so
/// a patch failure can never silence the warning.
async fn flag_appointment<C>(client: &C, kind: SweepKind, mut appointment: Appointment) -> Result<()>
where
    C: Calendar + Notifier,
{
    client
        .send(
            MailCategory::Overdue,
            kind.mail_subject(),
            &warning_body(kind, &appointment),
        )
        .await?;

    let missed = kind.missed_tag();
    appointment.categories.add(missed);
    let patch = EventPatch {
        subject: Some(format!("{}: {}", missed, appointment.subject)),
        categories: Some(appointment.categories.clone().into_vec()),
        ..Default::default()
    };
    client.patch_event(&appointment.id, &patch).await?;
    tracing::info!(subject = %appointment.subject, "appointment flagged");
    Ok(())
}

fn warning_body(kind: SweepKind, appointment: &Appointment) -> String {
    let mut lines = vec![
        kind.mail_headline().to_string(),
        format!("  Subject: {}", appointment.subject),
        format!("  Start time: {} (GMT)", appointment.start.date_time),
        format!("  End time: {} (GMT)", appointment.end.date_time),
        String::new(),
        "Attendee list:".to_string(),
    ];
    for attendee in &appointment.attendees {
        lines.push(format!(
            "  {}",
            attendee.email_address.address.to_lowercase()
        ));
    }
    lines.push(String::new());
    lines.push("Meeting description:".to_string());
    lines.push(appointment.body_preview.clone());
    lines.join("\r\n")
}
