//! Event resource attribute model.
//!
//! The orchestrator hands the provider flat attribute maps. These types are
//! what those maps deserialize into once they have passed schema validation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::validate::{DATETIME_FORMAT, parse_datetime};

/// A wall-clock time (`YYYY-MM-DD HH:MM:SS`) in the provider's fixed zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WallClock(NaiveDateTime);

impl WallClock {
    pub fn new(datetime: NaiveDateTime) -> Self {
        WallClock(datetime)
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl FromStr for WallClock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_datetime(s).map(WallClock)
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATETIME_FORMAT))
    }
}

impl Serialize for WallClock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WallClock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|e| {
            serde::de::Error::custom(format!("{s:?} is not YYYY-MM-DD HH:MM:SS: {e}"))
        })
    }
}

/// Whether the event blocks time on the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transparency {
    Opaque,
    #[default]
    Transparent,
}

impl Transparency {
    pub const VALUES: &'static [&'static str] = &["opaque", "transparent"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Transparency::Opaque => "opaque",
            Transparency::Transparent => "transparent",
        }
    }
}

impl FromStr for Transparency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opaque" => Ok(Transparency::Opaque),
            "transparent" => Ok(Transparency::Transparent),
            other => Err(format!("unknown transparency: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub const VALUES: &'static [&'static str] = &["public", "private"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(format!("unknown visibility: {other}")),
        }
    }
}

/// An invited guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(default)]
    pub optional: bool,
}

/// The attendee set, keyed by email.
///
/// Duplicate emails collapse into one entry. If any of the duplicates is
/// required, the collapsed entry is required. Iteration is in email order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attendees(BTreeMap<String, bool>);

impl Attendees {
    pub fn insert(&mut self, attendee: Attendee) {
        self.0
            .entry(attendee.email)
            .and_modify(|optional| *optional = *optional && attendee.optional)
            .or_insert(attendee.optional);
    }

    pub fn iter(&self) -> impl Iterator<Item = Attendee> + '_ {
        self.0.iter().map(|(email, optional)| Attendee {
            email: email.clone(),
            optional: *optional,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Attendee> for Attendees {
    fn from_iter<I: IntoIterator<Item = Attendee>>(iter: I) -> Self {
        let mut attendees = Attendees::default();
        for attendee in iter {
            attendees.insert(attendee);
        }
        attendees
    }
}

impl Serialize for Attendees {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Attendees {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<Attendee>::deserialize(deserializer)?
            .into_iter()
            .collect())
    }
}

fn default_true() -> bool {
    true
}

/// User-settable attributes of an event resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAttributes {
    pub start: WallClock,
    pub end: WallClock,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub transparency: Transparency,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default = "default_true")]
    pub guests_can_invite_others: bool,
    #[serde(default = "default_true")]
    pub guests_can_modify: bool,
    #[serde(default = "default_true")]
    pub guests_can_see_other_guests: bool,
    /// Only drives the notification side effect of mutating calls.
    #[serde(default = "default_true")]
    pub send_notifications: bool,
    #[serde(default)]
    pub attendee: Attendees,
}

impl EventAttributes {
    /// Attributes with every optional field at its default.
    pub fn new(start: WallClock, end: WallClock) -> Self {
        EventAttributes {
            start,
            end,
            location: String::new(),
            description: String::new(),
            transparency: Transparency::default(),
            visibility: Visibility::default(),
            guests_can_invite_others: true,
            guests_can_modify: true,
            guests_can_see_other_guests: true,
            send_notifications: true,
            attendee: Attendees::default(),
        }
    }
}

/// Attributes only ever written from the remote event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Computed {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub hangout_link: String,
    #[serde(default)]
    pub html_link: String,
}

/// Stored state of one event resource instance.
///
/// `id` is empty until the first successful create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventState {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub attributes: EventAttributes,
    #[serde(flatten)]
    pub computed: Computed,
}

impl EventState {
    pub fn new(id: impl Into<String>, attributes: EventAttributes) -> Self {
        EventState {
            id: id.into(),
            attributes,
            computed: Computed::default(),
        }
    }

    pub fn is_present(&self) -> bool {
        !self.id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attendee(email: &str, optional: bool) -> Attendee {
        Attendee {
            email: email.to_string(),
            optional,
        }
    }

    #[test]
    fn test_duplicate_attendees_collapse_by_email() {
        let attendees: Attendees = vec![
            attendee("bob@example.com", true),
            attendee("alice@example.com", true),
            attendee("bob@example.com", false),
        ]
        .into_iter()
        .collect();

        assert_eq!(attendees.len(), 2);
        assert_eq!(
            attendees.iter().collect::<Vec<_>>(),
            vec![
                attendee("alice@example.com", true),
                attendee("bob@example.com", false),
            ]
        );
    }

    #[test]
    fn test_wall_clock_only_parses_canonical_form() {
        assert_eq!(
            "2024-01-01 09:05:00".parse::<WallClock>().unwrap().to_string(),
            "2024-01-01 09:05:00"
        );
        assert!("2024-1-1 9:5:0".parse::<WallClock>().is_err());
        assert!("2024-01-01  09:05:00".parse::<WallClock>().is_err());
        assert!("2024-01-01 23:59:60".parse::<WallClock>().is_err());

        let err = serde_json::from_value::<EventAttributes>(json!({
            "start": "2024-1-1 10:00:00",
            "end": "2024-01-01 11:00:00",
        }))
        .unwrap_err();
        assert!(err.to_string().contains("is not YYYY-MM-DD HH:MM:SS"));
    }

    #[test]
    fn test_attributes_defaults() {
        let attributes: EventAttributes = serde_json::from_value(json!({
            "start": "2024-01-01 10:00:00",
            "end": "2024-01-01 11:00:00",
        }))
        .unwrap();

        assert_eq!(attributes.transparency, Transparency::Transparent);
        assert_eq!(attributes.visibility, Visibility::Public);
        assert!(attributes.guests_can_invite_others);
        assert!(attributes.guests_can_modify);
        assert!(attributes.guests_can_see_other_guests);
        assert!(attributes.send_notifications);
        assert!(attributes.attendee.is_empty());
        assert_eq!(attributes.start.to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn test_state_is_flat() {
        let state: EventState = serde_json::from_value(json!({
            "id": "abc123",
            "start": "2024-01-01 10:00:00",
            "end": "2024-01-01 11:00:00",
            "visibility": "private",
            "attendee": [{"email": "alice@example.com"}],
            "summary": "1on1",
            "html_link": "https://www.google.com/calendar/event?eid=abc123",
        }))
        .unwrap();

        assert!(state.is_present());
        assert_eq!(state.attributes.visibility, Visibility::Private);
        assert_eq!(state.computed.summary, "1on1");
        assert_eq!(state.computed.event_id, "");

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["id"], "abc123");
        assert_eq!(value["start"], "2024-01-01 10:00:00");
        assert_eq!(value["transparency"], "transparent");
        assert_eq!(value["attendee"], json!([{"email": "alice@example.com", "optional": false}]));
        assert_eq!(value["summary"], "1on1");
    }

    #[test]
    fn test_state_without_id_is_absent() {
        let state = EventState::new(
            "",
            EventAttributes::new(
                "2024-01-01 10:00:00".parse().unwrap(),
                "2024-01-01 11:00:00".parse().unwrap(),
            ),
        );
        assert!(!state.is_present());
    }
}
