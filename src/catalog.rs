//! The fixed set of event resource types.
//!
//! Every type shares the event schema and the lifecycle handlers; they only
//! differ in the title written to the events they manage.

use vkg_core::error::{VkgError, VkgResult};
use vkg_core::protocol::ResourceSchema;
use vkg_core::schema::event_schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventResource {
    pub type_name: &'static str,
    /// Summary of every event of this type; not user-settable.
    pub title: &'static str,
}

const fn event_resource(type_name: &'static str, title: &'static str) -> EventResource {
    EventResource { type_name, title }
}

pub const RESOURCES: [EventResource; 3] = [
    event_resource("vkg_1on1", "1on1"),
    event_resource("vkg_nomikai", "飲み会"),
    event_resource("vkg_tsuribori", "釣り堀"),
];

pub fn lookup(type_name: &str) -> VkgResult<&'static EventResource> {
    RESOURCES
        .iter()
        .find(|r| r.type_name == type_name)
        .ok_or_else(|| VkgError::UnknownResource(type_name.to_string()))
}

impl EventResource {
    pub fn schema(&self) -> ResourceSchema {
        ResourceSchema {
            resource_type: self.type_name,
            title: self.title,
            attributes: event_schema(),
        }
    }
}
