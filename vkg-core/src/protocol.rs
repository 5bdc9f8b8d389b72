//! Provider protocol types.
//!
//! Defines the JSON protocol used between the orchestrator and the provider
//! binary: one request per line on stdin, one response per line on stdout.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::event::EventState;
use crate::schema::Attribute;

/// Commands the provider implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    GetSchema,
    Validate,
    Create,
    Read,
    Update,
    Delete,
}

/// Request sent from the orchestrator to the provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: Value,
}

/// Response sent from the provider to the orchestrator.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success {
        data: T,
    },
    Error {
        error: String,
        /// Per-attribute validation failures, when that is what went wrong.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        diagnostics: Vec<ValidationError>,
    },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data }).unwrap_or_else(|e| {
            Response::<()>::error(&format!("Failed to serialize response: {e}"), Vec::new())
        })
    }
}

impl Response<()> {
    pub fn error(msg: &str, diagnostics: Vec<ValidationError>) -> String {
        let response = Response::<()>::Error {
            error: msg.to_string(),
            diagnostics,
        };
        // Strings and plain structs always serialize.
        serde_json::to_value(&response)
            .map(|v| v.to_string())
            .unwrap_or_else(|_| serde_json::json!({"status": "error", "error": msg}).to_string())
    }
}

/// One resource type as described by `get_schema`.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSchema {
    pub resource_type: &'static str,
    /// Fixed display title written to every event of this type.
    pub title: &'static str,
    pub attributes: Vec<Attribute>,
}

/// Check a declared configuration without touching the remote API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateParams {
    pub resource_type: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateParams {
    pub resource_type: String,
    pub config: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadParams {
    pub resource_type: String,
    pub state: EventState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateParams {
    pub resource_type: String,
    /// Stored state, used for the remote id.
    pub state: EventState,
    /// Desired configuration.
    pub config: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteParams {
    pub resource_type: String,
    pub state: EventState,
}
