//! Organization endpoints.

use crate::api::Organization;
use crate::error::Result;
use crate::http::{ClientConfig, Transport};

/// List the organizations the authenticated user belongs to.
pub async fn current_user_orgs(
    transport: &dyn Transport,
    config: &ClientConfig,
) -> Result<Vec<Organization>> {
    let url = config.api_url("user/orgs");
    let value = transport.get(&url, config).await?;
    Ok(serde_json::from_value(value)?)
}
