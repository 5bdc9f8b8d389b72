use anyhow::{Context, Result, bail};
use tracing::info;
use vkg_core::{EventAttributes, EventState};

use super::{bounded, mutation_options, read_event};
use crate::catalog::EventResource;
use crate::config::ProviderConfig;
use crate::convert::ToGoogle;
use crate::google::CalendarApi;

/// Overwrite the remote event with `attributes` and re-read it.
///
/// Google may answer with a different id; the new id is the one kept.
pub async fn handle<A: CalendarApi>(
    api: &A,
    config: &ProviderConfig,
    resource: &EventResource,
    state: EventState,
    attributes: EventAttributes,
) -> Result<EventState> {
    if !state.is_present() {
        bail!(
            "Cannot update {} event: it has no remote id",
            resource.type_name
        );
    }

    let google_event = attributes.to_google(resource.title, config)?;

    let updated = bounded(
        config.timeout,
        api.update(
            &config.calendar_id,
            &state.id,
            &google_event,
            mutation_options(config, &attributes),
        ),
    )
    .await
    .with_context(|| format!("Failed to update event: {}", state.id))?;

    let id = if updated.id.is_empty() {
        state.id
    } else {
        if updated.id != state.id {
            info!(old = %state.id, new = %updated.id, "event id changed");
        }
        updated.id.clone()
    };
    info!(resource = resource.type_name, id = %id, "updated event");

    let state = EventState::new(id, attributes);
    read_event::read_back(api, config, state, updated).await
}
