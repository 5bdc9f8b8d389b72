use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};
use vkg_core::EventState;

use super::bounded;
use crate::config::ProviderConfig;
use crate::convert::FromGoogle;
use crate::google::CalendarApi;
use crate::google::types::Event;

pub async fn handle<A: CalendarApi>(
    api: &A,
    config: &ProviderConfig,
    state: EventState,
) -> Result<Option<EventState>> {
    refresh(api, config, &state).await
}

/// Fetch the remote event behind `state`.
///
/// `None` means the event is gone: deleted, cancelled, or never created.
/// Settings Google does not echo back are taken from `state`.
pub async fn refresh<A: CalendarApi>(
    api: &A,
    config: &ProviderConfig,
    state: &EventState,
) -> Result<Option<EventState>> {
    if !state.is_present() {
        debug!("no remote id, nothing to read");
        return Ok(None);
    }

    match bounded(config.timeout, api.get(&config.calendar_id, &state.id)).await {
        Ok(event) if event.is_cancelled() => {
            info!(id = %state.id, "event was cancelled remotely");
            Ok(None)
        }
        Ok(event) => EventState::from_google(event, &state.attributes, config.time_zone)
            .map(Some)
            .with_context(|| format!("Failed to convert event: {}", state.id)),
        Err(e) if e.is_gone() => {
            info!(id = %state.id, "event no longer exists");
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read event: {}", state.id)),
    }
}

/// Re-read an event that was just inserted or updated.
///
/// If the read fails, the state is rebuilt from `written`, the body Google
/// answered the write with, so the id of the written event is kept.
pub async fn read_back<A: CalendarApi>(
    api: &A,
    config: &ProviderConfig,
    state: EventState,
    written: Event,
) -> Result<EventState> {
    match refresh(api, config, &state).await {
        Ok(Some(refreshed)) => Ok(refreshed),
        Ok(None) => bail!("Event {} disappeared right after it was written", state.id),
        Err(e) => {
            warn!(id = %state.id, "read-back failed, using the write response: {:#}", e);
            match EventState::from_google(written, &state.attributes, config.time_zone) {
                Ok(mut fallback) => {
                    fallback.id = state.id.clone();
                    fallback.computed.event_id = state.id;
                    Ok(fallback)
                }
                Err(_) => Ok(state),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::commands::create_event;
    use crate::testing::{Call, FakeCalendar, config};
    use vkg_core::{EventAttributes, Transparency, WallClock};

    fn attributes() -> EventAttributes {
        EventAttributes::new(
            "2024-05-01 10:00:00".parse::<WallClock>().unwrap(),
            "2024-05-01 10:30:00".parse::<WallClock>().unwrap(),
        )
    }

    async fn created(api: &FakeCalendar) -> EventState {
        let resource = catalog::lookup("vkg_1on1").unwrap();
        create_event::handle(api, &config(), resource, attributes())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_read_is_idempotent() {
        let api = FakeCalendar::new();
        let state = created(&api).await;

        let first = handle(&api, &config(), state.clone()).await.unwrap();
        let second = handle(&api, &config(), state.clone()).await.unwrap();

        assert_eq!(first, Some(state));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_remotely_deleted_event_is_absent() {
        let api = FakeCalendar::new();
        let state = created(&api).await;
        api.remove(&state.id);

        assert_eq!(handle(&api, &config(), state).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cancelled_event_is_absent() {
        let api = FakeCalendar::new();
        let state = created(&api).await;
        api.cancel(&state.id);

        assert_eq!(handle(&api, &config(), state).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_state_without_id_is_not_fetched() {
        let api = FakeCalendar::new();
        let state = EventState::new("", attributes());

        assert_eq!(refresh(&api, &config(), &state).await.unwrap(), None);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remote_changes_are_reported() {
        let api = FakeCalendar::new();
        let state = created(&api).await;
        api.edit(&state.id, |event| {
            event.location = "Room 4".to_string();
            event.transparency = "opaque".to_string();
            event.guests_can_invite_others = Some(false);
        });

        let refreshed = handle(&api, &config(), state).await.unwrap().unwrap();

        assert_eq!(refreshed.attributes.location, "Room 4");
        assert_eq!(refreshed.attributes.transparency, Transparency::Opaque);
        assert!(!refreshed.attributes.guests_can_invite_others);
        assert!(refreshed.attributes.guests_can_see_other_guests);
    }

    #[tokio::test]
    async fn test_other_failures_are_errors() {
        let api = FakeCalendar::new();
        let state = created(&api).await;
        api.fail_with(403);

        let err = handle(&api, &config(), state).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read event: evt1"));
        assert!(matches!(api.calls().last(), Some(Call::Get { .. })));
    }
}
