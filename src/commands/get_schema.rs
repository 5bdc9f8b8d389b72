use vkg_core::protocol::ResourceSchema;

use crate::catalog::{EventResource, RESOURCES};

pub fn handle() -> Vec<ResourceSchema> {
    RESOURCES.iter().map(EventResource::schema).collect()
}
