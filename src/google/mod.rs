//! Google Calendar API access.
//!
//! `CalendarApi` is the seam between the lifecycle handlers and the remote
//! service. `GoogleCalendar` is the HTTP implementation.

pub mod client;
pub mod types;

use std::time::Duration;

use thiserror::Error;

use crate::config::ProviderConfig;

pub use client::GoogleCalendar;

/// Side-channel options of a mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOptions {
    /// Email guests about the change.
    pub send_notifications: bool,
    /// Cap on the attendees echoed back in the response.
    pub max_attendees: u32,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Google Calendar API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request URL: {0}")]
    Url(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ApiError {
    /// The event does not exist (anymore) on the remote side.
    pub fn is_gone(&self) -> bool {
        matches!(self, ApiError::Status { status: 404 | 410, .. })
    }
}

/// Operations on the events of one calendar.
pub trait CalendarApi {
    /// Build an authenticated handle from the process configuration.
    async fn connect(config: &ProviderConfig) -> anyhow::Result<Self>
    where
        Self: Sized;

    async fn insert(
        &self,
        calendar_id: &str,
        event: &types::Event,
        options: MutationOptions,
    ) -> Result<types::Event, ApiError>;

    async fn get(&self, calendar_id: &str, event_id: &str) -> Result<types::Event, ApiError>;

    async fn update(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &types::Event,
        options: MutationOptions,
    ) -> Result<types::Event, ApiError>;

    async fn delete(
        &self,
        calendar_id: &str,
        event_id: &str,
        send_notifications: bool,
    ) -> Result<(), ApiError>;
}
