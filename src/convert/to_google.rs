use anyhow::{Context, Result, anyhow};
use chrono::TimeZone;
use chrono_tz::Tz;
use vkg_core::{Attendee, EventAttributes, WallClock};

use crate::config::ProviderConfig;
use crate::google::types::{Event, EventAttendee, EventDateTime, EventSource};

pub trait ToGoogle {
    /// Build the request body for an event titled `summary`.
    fn to_google(&self, summary: &str, config: &ProviderConfig) -> Result<Event>;
}

impl ToGoogle for EventAttributes {
    fn to_google(&self, summary: &str, config: &ProviderConfig) -> Result<Event> {
        let start = wall_clock_to_google(&self.start, config.time_zone).context("Invalid start")?;
        let end = wall_clock_to_google(&self.end, config.time_zone).context("Invalid end")?;

        Ok(Event {
            summary: summary.to_string(),
            description: self.description.clone(),
            location: self.location.clone(),
            start,
            end,
            transparency: self.transparency.as_str().to_string(),
            visibility: self.visibility.as_str().to_string(),
            // Always explicit: leaving these out would fall back to Google's defaults.
            guests_can_invite_others: Some(self.guests_can_invite_others),
            guests_can_modify: self.guests_can_modify,
            guests_can_see_other_guests: Some(self.guests_can_see_other_guests),
            attendees: self.attendee.iter().map(attendee_to_google).collect(),
            source: Some(EventSource {
                title: config.source_title.clone(),
                url: config.source_url.clone(),
            }),
            ..Default::default()
        })
    }
}

fn attendee_to_google(attendee: Attendee) -> EventAttendee {
    EventAttendee {
        email: attendee.email,
        optional: attendee.optional,
        response_status: String::new(),
    }
}

/// Interpret a wall-clock time in `zone` and send it as RFC 3339.
fn wall_clock_to_google(time: &WallClock, zone: Tz) -> Result<EventDateTime> {
    let local = zone
        .from_local_datetime(&time.naive())
        .earliest()
        .ok_or_else(|| anyhow!("{} does not exist in time zone {}", time, zone.name()))?;

    Ok(EventDateTime {
        date: None,
        date_time: Some(local.fixed_offset()),
        time_zone: String::new(),
    })
}
