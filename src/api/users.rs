//! User endpoints.

use crate::api::User;
use crate::error::Result;
use crate::http::{ClientConfig, Transport};

/// Fetch the authenticated user. Requires a token or basic-auth headers.
pub async fn current_user(transport: &dyn Transport, config: &ClientConfig) -> Result<User> {
    let url = config.api_url("user");
    let value = transport.get(&url, config).await?;
    Ok(serde_json::from_value(value)?)
}

/// Look up a user by username; unknown users become `None`.
pub async fn get_user(
    transport: &dyn Transport,
    config: &ClientConfig,
    username: &str,
) -> Result<Option<User>> {
    let url = config.api_url(&format!("users/{}", username));
    match transport.get(&url, config).await {
        Ok(value) => Ok(Some(serde_json::from_value(value)?)),
        Err(err) => {
            tracing::debug!(username = %username, error = %err, "get_user failed");
            Ok(None)
        }
    }
}
