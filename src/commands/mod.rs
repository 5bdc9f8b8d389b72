pub mod create_event;
pub mod delete_event;
pub mod get_schema;
pub mod read_event;
pub mod update_event;
pub mod validate;

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use vkg_core::error::VkgError;
use vkg_core::protocol::{
    Command, CreateParams, DeleteParams, ReadParams, Request, Response, UpdateParams,
};
use vkg_core::{EventAttributes, EventState};

use crate::catalog;
use crate::config::ProviderConfig;
use crate::google::{ApiError, CalendarApi, MutationOptions};

/// Serves protocol requests against one calendar backend.
///
/// The backend is connected on the first request that needs it, so schema
/// and validation requests work without credentials.
pub struct Provider<A> {
    config: ProviderConfig,
    api: OnceCell<A>,
}

impl<A: CalendarApi> Provider<A> {
    pub fn new(config: ProviderConfig) -> Self {
        Provider {
            config,
            api: OnceCell::new(),
        }
    }

    #[cfg(test)]
    pub fn with_api(config: ProviderConfig, api: A) -> Self {
        Provider {
            config,
            api: OnceCell::from(api),
        }
    }

    /// Connecting includes the token exchange, so it gets the same bound as
    /// every remote call.
    async fn api(&self) -> Result<&A> {
        let timeout = self.config.timeout;

        self.api
            .get_or_try_init(|| async {
                tokio::time::timeout(timeout, A::connect(&self.config))
                    .await
                    .map_err(|_| ApiError::Timeout(timeout))?
            })
            .await
            .context("Failed to connect to Google Calendar")
    }

    /// Answer one raw request line.
    pub async fn handle_line(&self, line: &str) -> String {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Response::error(&format!("Failed to parse request: {}", e), Vec::new()),
        }
    }

    pub async fn handle_request(&self, request: Request) -> String {
        debug!(command = ?request.command, "handling request");
        let params = request.params;

        match request.command {
            Command::GetSchema => Response::success(get_schema::handle()),
            Command::Validate => respond(parse_params(params).and_then(validate::handle)),
            Command::Create => respond(self.create(params).await),
            Command::Read => respond(self.read(params).await),
            Command::Update => respond(self.update(params).await),
            Command::Delete => respond(self.delete(params).await),
        }
    }

    async fn create(&self, params: Value) -> Result<EventState> {
        let params: CreateParams = parse_params(params)?;
        let resource = catalog::lookup(&params.resource_type)?;
        let attributes = vkg_core::schema::parse_attributes(resource.type_name, &params.config)?;

        create_event::handle(self.api().await?, &self.config, resource, attributes).await
    }

    async fn read(&self, params: Value) -> Result<Option<EventState>> {
        let params: ReadParams = parse_params(params)?;
        catalog::lookup(&params.resource_type)?;

        if !params.state.is_present() {
            return Ok(None);
        }
        read_event::handle(self.api().await?, &self.config, params.state).await
    }

    async fn update(&self, params: Value) -> Result<EventState> {
        let params: UpdateParams = parse_params(params)?;
        let resource = catalog::lookup(&params.resource_type)?;
        let attributes = vkg_core::schema::parse_attributes(resource.type_name, &params.config)?;

        update_event::handle(
            self.api().await?,
            &self.config,
            resource,
            params.state,
            attributes,
        )
        .await
    }

    async fn delete(&self, params: Value) -> Result<()> {
        let params: DeleteParams = parse_params(params)?;
        catalog::lookup(&params.resource_type)?;

        if !params.state.is_present() {
            debug!("event was never created, nothing to delete");
            return Ok(());
        }
        delete_event::handle(self.api().await?, &self.config, &params.state).await
    }
}

fn parse_params<P: DeserializeOwned>(params: Value) -> Result<P> {
    serde_json::from_value(params).context("Invalid params")
}

fn respond<T: Serialize>(result: Result<T>) -> String {
    match result {
        Ok(data) => Response::success(data),
        Err(e) => {
            warn!("{:#}", e);
            let diagnostics = match e.downcast_ref::<VkgError>() {
                Some(VkgError::Invalid { errors, .. }) => errors.clone(),
                _ => Vec::new(),
            };
            Response::error(&format!("{:#}", e), diagnostics)
        }
    }
}

/// Run a remote call, giving up after `timeout`.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| ApiError::Timeout(timeout))?
}

fn mutation_options(config: &ProviderConfig, attributes: &EventAttributes) -> MutationOptions {
    MutationOptions {
        send_notifications: attributes.send_notifications,
        max_attendees: config.max_attendees,
    }
}
