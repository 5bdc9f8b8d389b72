//! Core types for the vkg provider.
//!
//! This crate provides the pieces shared by the provider binary and anything
//! that talks to it:
//! - `event`: the typed attribute model of an event resource
//! - `schema`: the declared attribute schema and its validation
//! - `protocol`: the JSON protocol spoken with the orchestrator

pub mod error;
pub mod event;
pub mod protocol;
pub mod schema;
pub mod validate;

// Re-export event types at crate root for convenience
pub use event::*;
