use anyhow::{Context, Result, bail};
use tracing::info;
use vkg_core::{EventAttributes, EventState};

use super::{bounded, mutation_options, read_event};
use crate::catalog::EventResource;
use crate::config::ProviderConfig;
use crate::convert::ToGoogle;
use crate::google::CalendarApi;

pub async fn handle<A: CalendarApi>(
    api: &A,
    config: &ProviderConfig,
    resource: &EventResource,
    attributes: EventAttributes,
) -> Result<EventState> {
    // Google assigns the id
    let google_event = attributes.to_google(resource.title, config)?;

    let created = bounded(
        config.timeout,
        api.insert(
            &config.calendar_id,
            &google_event,
            mutation_options(config, &attributes),
        ),
    )
    .await
    .with_context(|| format!("Failed to create {} event", resource.type_name))?;

    if created.id.is_empty() {
        bail!("Google returned no id for the new {} event", resource.type_name);
    }
    info!(resource = resource.type_name, id = %created.id, "created event");

    let state = EventState::new(created.id.clone(), attributes);
    read_event::read_back(api, config, state, created).await
}
