use anyhow::{Context, Result};
use chrono_tz::Tz;
use vkg_core::{Attendee, Computed, EventAttributes, EventState, Transparency, Visibility, WallClock};

use crate::google::types::{Event, EventDateTime};

pub trait FromGoogle {
    /// Rebuild local state from a remote event.
    ///
    /// `prior` supplies values the remote event does not carry.
    fn from_google(event: Event, prior: &EventAttributes, zone: Tz) -> Result<Self>
    where
        Self: Sized;
}

impl FromGoogle for EventState {
    fn from_google(event: Event, prior: &EventAttributes, zone: Tz) -> Result<Self> {
        let start = google_to_wall_clock(&event.start, zone).context("Event has no start time")?;
        let end = google_to_wall_clock(&event.end, zone).context("Event has no end time")?;

        let attributes = EventAttributes {
            start,
            end,
            location: event.location,
            description: event.description,
            transparency: transparency_from_google(&event.transparency),
            visibility: visibility_from_google(&event.visibility, prior.visibility),
            // Google leaves these out when they hold its default; keep ours.
            guests_can_invite_others: event
                .guests_can_invite_others
                .unwrap_or(prior.guests_can_invite_others),
            guests_can_modify: event.guests_can_modify,
            guests_can_see_other_guests: event
                .guests_can_see_other_guests
                .unwrap_or(prior.guests_can_see_other_guests),
            send_notifications: prior.send_notifications,
            attendee: event
                .attendees
                .into_iter()
                .filter(|a| !a.email.is_empty())
                .map(|a| Attendee {
                    email: a.email,
                    optional: a.optional,
                })
                .collect(),
        };

        Ok(EventState {
            id: event.id.clone(),
            attributes,
            computed: Computed {
                summary: event.summary,
                event_id: event.id,
                hangout_link: event.hangout_link,
                html_link: event.html_link,
            },
        })
    }
}

/// Google omits transparency when it is `opaque`.
fn transparency_from_google(value: &str) -> Transparency {
    match value {
        "" => Transparency::Opaque,
        other => other.parse().unwrap_or_default(),
    }
}

/// Google's `default` defers to the calendar's setting, which we cannot see.
fn visibility_from_google(value: &str, prior: Visibility) -> Visibility {
    match value {
        "" | "default" => prior,
        other => other.parse().unwrap_or_default(),
    }
}

/// Express a remote start/end as a wall-clock time in `zone`.
///
/// All-day events map to midnight of their date.
fn google_to_wall_clock(time: &EventDateTime, zone: Tz) -> Option<WallClock> {
    if let Some(dt) = time.date_time {
        Some(WallClock::new(dt.with_timezone(&zone).naive_local()))
    } else {
        time.date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(WallClock::new)
    }
}
