use anyhow::{Context, Result};
use tracing::{debug, info};
use vkg_core::EventState;

use super::bounded;
use crate::config::ProviderConfig;
use crate::google::CalendarApi;

pub async fn handle<A: CalendarApi>(
    api: &A,
    config: &ProviderConfig,
    state: &EventState,
) -> Result<()> {
    if !state.is_present() {
        debug!("event was never created, nothing to delete");
        return Ok(());
    }

    let result = bounded(
        config.timeout,
        api.delete(
            &config.calendar_id,
            &state.id,
            state.attributes.send_notifications,
        ),
    )
    .await;

    match result {
        Ok(()) => {
            info!(id = %state.id, "deleted event");
            Ok(())
        }
        Err(e) if e.is_gone() => {
            info!(id = %state.id, "event was already deleted");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to delete event: {}", state.id)),
    }
}
