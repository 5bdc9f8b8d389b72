//! In-memory `CalendarApi` for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::{ProviderConfig, RawConfig};
use crate::google::types::{Event, STATUS_CANCELLED};
use crate::google::{ApiError, CalendarApi, MutationOptions};

pub fn config() -> ProviderConfig {
    ProviderConfig::from_raw(RawConfig::default()).unwrap()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Insert {
        calendar_id: String,
        options: MutationOptions,
    },
    Get {
        event_id: String,
    },
    Update {
        event_id: String,
        options: MutationOptions,
    },
    Delete {
        event_id: String,
        send_notifications: bool,
    },
}

/// Behaves like the events collection of a single Google calendar.
///
/// Ids come from the queue given to `with_ids`; an update consumes the next
/// queued id when there is one, mimicking an id reassignment.
#[derive(Default)]
pub struct FakeCalendar {
    events: Mutex<HashMap<String, Event>>,
    calls: Mutex<Vec<Call>>,
    ids: Mutex<VecDeque<String>>,
    counter: Mutex<u32>,
    failure: Mutex<Option<u16>>,
    read_failure: Mutex<Option<u16>>,
    delay: Option<Duration>,
}

impl FakeCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: &[&str]) -> Self {
        let fake = Self::default();
        fake.ids
            .lock()
            .unwrap()
            .extend(ids.iter().map(|id| id.to_string()));
        fake
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(delay: Duration) -> Self {
        FakeCalendar {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Answer every following call with this HTTP status.
    pub fn fail_with(&self, status: u16) {
        *self.failure.lock().unwrap() = Some(status);
    }

    /// Answer every following `get` with this HTTP status.
    pub fn fail_reads_with(&self, status: u16) {
        *self.read_failure.lock().unwrap() = Some(status);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn event(&self, id: &str) -> Option<Event> {
        self.events.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Delete an event behind the provider's back.
    pub fn remove(&self, id: &str) {
        self.events.lock().unwrap().remove(id);
    }

    /// Change an event behind the provider's back.
    pub fn edit(&self, id: &str, change: impl FnOnce(&mut Event)) {
        if let Some(event) = self.events.lock().unwrap().get_mut(id) {
            change(event);
        }
    }

    /// Cancel an event behind the provider's back.
    pub fn cancel(&self, id: &str) {
        self.edit(id, |event| event.status = STATUS_CANCELLED.to_string());
    }

    fn next_id(&self) -> String {
        if let Some(id) = self.ids.lock().unwrap().pop_front() {
            return id;
        }
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        format!("evt{}", *counter)
    }

    async fn begin(&self, call: Call) -> Result<(), ApiError> {
        let read_failure = match call {
            Call::Get { .. } => *self.read_failure.lock().unwrap(),
            _ => None,
        };
        self.calls.lock().unwrap().push(call);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match read_failure.or(*self.failure.lock().unwrap()) {
            Some(status) => Err(status_error(status)),
            None => Ok(()),
        }
    }

    /// Store `event` under `id` the way Google would.
    fn store(&self, id: String, event: &Event) -> Event {
        let mut stored = event.clone();
        stored.id = id.clone();
        stored.status = "confirmed".to_string();
        stored.html_link = format!("https://www.google.com/calendar/event?eid={id}");
        stored.hangout_link = format!("https://meet.google.com/{id}");
        // Google leaves out flags that hold its default.
        if stored.guests_can_invite_others == Some(true) {
            stored.guests_can_invite_others = None;
        }
        if stored.guests_can_see_other_guests == Some(true) {
            stored.guests_can_see_other_guests = None;
        }
        if stored.transparency == "opaque" {
            stored.transparency.clear();
        }

        self.events.lock().unwrap().insert(id, stored.clone());
        stored
    }
}

fn status_error(status: u16) -> ApiError {
    ApiError::Status {
        status,
        message: format!("fake status {status}"),
    }
}

impl CalendarApi for FakeCalendar {
    async fn connect(_config: &ProviderConfig) -> anyhow::Result<Self> {
        anyhow::bail!("FakeCalendar must be injected with Provider::with_api")
    }

    async fn insert(
        &self,
        calendar_id: &str,
        event: &Event,
        options: MutationOptions,
    ) -> Result<Event, ApiError> {
        self.begin(Call::Insert {
            calendar_id: calendar_id.to_string(),
            options,
        })
        .await?;

        let id = self.next_id();
        Ok(self.store(id, event))
    }

    async fn get(&self, _calendar_id: &str, event_id: &str) -> Result<Event, ApiError> {
        self.begin(Call::Get {
            event_id: event_id.to_string(),
        })
        .await?;

        self.event(event_id).ok_or_else(|| status_error(404))
    }

    async fn update(
        &self,
        _calendar_id: &str,
        event_id: &str,
        event: &Event,
        options: MutationOptions,
    ) -> Result<Event, ApiError> {
        self.begin(Call::Update {
            event_id: event_id.to_string(),
            options,
        })
        .await?;

        if self.events.lock().unwrap().remove(event_id).is_none() {
            return Err(status_error(404));
        }

        let id = self
            .ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| event_id.to_string());
        Ok(self.store(id, event))
    }

    async fn delete(
        &self,
        _calendar_id: &str,
        event_id: &str,
        send_notifications: bool,
    ) -> Result<(), ApiError> {
        self.begin(Call::Delete {
            event_id: event_id.to_string(),
            send_notifications,
        })
        .await?;

        match self.events.lock().unwrap().remove(event_id) {
            Some(_) => Ok(()),
            None => Err(status_error(410)),
        }
    }
}
