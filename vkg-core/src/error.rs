//! Error types for vkg operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A declared value rejected before any remote call was made.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{attribute}: {message}")]
pub struct ValidationError {
    /// Attribute path, e.g. `start` or `attendee.1.email`
    pub attribute: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur in vkg operations.
#[derive(Error, Debug)]
pub enum VkgError {
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    #[error("Invalid {resource} configuration: {}", join(.errors))]
    Invalid {
        resource: String,
        errors: Vec<ValidationError>,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for vkg operations.
pub type VkgResult<T> = Result<T, VkgError>;
