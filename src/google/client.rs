//! HTTP implementation of `CalendarApi`.
//!
//! Every request and response is traced at debug level (method, URL,
//! status, elapsed time) and response bodies at trace level, so
//! `VKG_LOG=trace` shows the full conversation with Google.

use std::time::Instant;

use anyhow::Context;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::types::{ErrorBody, Event};
use super::{ApiError, CalendarApi, MutationOptions};
use crate::config::{ProviderConfig, user_agent};
use crate::credentials::{self, CALENDAR_SCOPE};

pub struct GoogleCalendar {
    http: reqwest::Client,
    base: Url,
    access_token: String,
}

impl GoogleCalendar {
    pub fn new(base: Url, access_token: String) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent())
            .build()?;

        Ok(GoogleCalendar {
            http,
            base,
            access_token,
        })
    }

    /// `{base}/calendars/{calendar_id}/events[/{event_id}]`, segments escaped.
    fn events_url(&self, calendar_id: &str, event_id: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::Url(self.base.to_string()))?;
            segments.pop_if_empty().push("calendars").push(calendar_id).push("events");
            if let Some(id) = event_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(&self.access_token)
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        debug!(%method, %url, "google request");
        let started = Instant::now();
        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%method, %url, status = status.as_u16(), elapsed_ms = started.elapsed().as_millis() as u64, "google response");
        trace!(%body, "google response body");

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    async fn execute_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn send_updates(send_notifications: bool) -> &'static str {
    if send_notifications { "all" } else { "none" }
}

fn mutation_query(options: MutationOptions) -> [(&'static str, String); 2] {
    [
        ("sendUpdates", send_updates(options.send_notifications).to_string()),
        ("maxAttendees", options.max_attendees.to_string()),
    ]
}

impl CalendarApi for GoogleCalendar {
    async fn connect(config: &ProviderConfig) -> anyhow::Result<Self> {
        let access_token = credentials::access_token(CALENDAR_SCOPE).await?;
        GoogleCalendar::new(config.api_base.clone(), access_token)
            .context("Failed to build Google Calendar client")
    }

    async fn insert(
        &self,
        calendar_id: &str,
        event: &Event,
        options: MutationOptions,
    ) -> Result<Event, ApiError> {
        let url = self.events_url(calendar_id, None)?;
        let builder = self
            .request(Method::POST, url)
            .query(&mutation_query(options))
            .json(event);
        self.execute_json(builder).await
    }

    async fn get(&self, calendar_id: &str, event_id: &str) -> Result<Event, ApiError> {
        let url = self.events_url(calendar_id, Some(event_id))?;
        self.execute_json(self.request(Method::GET, url)).await
    }

    async fn update(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &Event,
        options: MutationOptions,
    ) -> Result<Event, ApiError> {
        let url = self.events_url(calendar_id, Some(event_id))?;
        let builder = self
            .request(Method::PUT, url)
            .query(&mutation_query(options))
            .json(event);
        self.execute_json(builder).await
    }

    async fn delete(
        &self,
        calendar_id: &str,
        event_id: &str,
        send_notifications: bool,
    ) -> Result<(), ApiError> {
        let url = self.events_url(calendar_id, Some(event_id))?;
        let builder = self
            .request(Method::DELETE, url)
            .query(&[("sendUpdates", send_updates(send_notifications))]);
        self.execute(builder).await.map(|_| ())
    }
}
