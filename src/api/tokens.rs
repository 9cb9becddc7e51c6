//! Application token endpoints.
//!
//! The forge gates token management behind basic auth, so every function here
//! expects a `ClientConfig` whose headers already carry the `Authorization:
//! Basic` pair (see `auth::basic_config`).

use crate::api::Token;
use crate::error::Result;
use crate::http::{ClientConfig, Transport};
use serde_json::json;

/// List the tokens registered for `username`.
///
/// The forge never returns secrets here, so listed tokens are unusable until
/// paired with a locally stored sha1.
pub async fn list_tokens(
    transport: &dyn Transport,
    config: &ClientConfig,
    username: &str,
) -> Result<Vec<Token>> {
    let url = config.api_url(&format!("users/{}/tokens", username));
    let value = transport.get(&url, config).await?;
    Ok(serde_json::from_value(value)?)
}

/// Create a token named `name`; the response carries the secret.
pub async fn create_token(
    transport: &dyn Transport,
    config: &ClientConfig,
    username: &str,
    name: &str,
) -> Result<Token> {
    let url = config.api_url(&format!("users/{}/tokens", username));
    let payload = json!({ "name": name });
    let value = transport.post(&url, &payload, config).await?;
    Ok(serde_json::from_value(value)?)
}

/// Delete a token by id.
pub async fn delete_token(
    transport: &dyn Transport,
    config: &ClientConfig,
    username: &str,
    id: i64,
) -> Result<()> {
    let url = config.api_url(&format!("users/{}/tokens/{}", username, id));
    transport.delete(&url, None, config).await?;
    Ok(())
}

/// Ensure a usable token named `name` exists.
///
/// A registered token whose secret we still hold (`stored_sha1`) is reused.
/// One registered under the same name without a locally held secret is dead
/// weight: it gets deleted and recreated, since the forge will not hand the
/// secret out twice.
pub async fn ensure_token(
    transport: &dyn Transport,
    config: &ClientConfig,
    username: &str,
    name: &str,
    stored_sha1: Option<&str>,
) -> Result<Token> {
    let tokens = list_tokens(transport, config, username).await?;
    let existing = tokens.into_iter().find(|t| t.name == name);

    if let Some(mut token) = existing {
        match stored_sha1 {
            Some(sha1) if !sha1.is_empty() => {
                token.sha1 = Some(sha1.to_string());
                return Ok(token);
            }
            _ => {
                tracing::debug!(name = %name, id = token.id, "replacing token with lost secret");
                delete_token(transport, config, username, token.id).await?;
            }
        }
    }

    create_token(transport, config, username, name).await
}
