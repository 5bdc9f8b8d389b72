use anyhow::Result;
use vkg_core::error::ValidationError;
use vkg_core::protocol::ValidateParams;

use crate::catalog;

/// Check a declared configuration. An empty list means it is valid.
pub fn handle(params: ValidateParams) -> Result<Vec<ValidationError>> {
    catalog::lookup(&params.resource_type)?;
    Ok(vkg_core::schema::validate(&params.config))
}
