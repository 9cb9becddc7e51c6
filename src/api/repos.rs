//! Repository CRUD and search endpoints.

use crate::api::{users, Repository};
use crate::error::{Error, Result};
use crate::http::{ClientConfig, Transport};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SEARCH_LIMIT: u32 = 50;

/// Payload for creating a repository under the authenticated user
#[derive(Debug, Clone, Serialize)]
pub struct NewRepository {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    /// Initialize with a first commit so the tree is browsable immediately
    pub auto_init: bool,
}

impl NewRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            private: None,
            auto_init: true,
        }
    }
}

/// Fields that may change on an existing repository
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

/// Search response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub data: Vec<Repository>,
}

/// Create a repository for the authenticated user.
pub async fn create_repo(
    transport: &dyn Transport,
    config: &ClientConfig,
    new_repo: &NewRepository,
) -> Result<Repository> {
    let url = config.api_url("user/repos");
    let payload = serde_json::to_value(new_repo)?;
    let value = transport.post(&url, &payload, config).await?;
    Ok(serde_json::from_value(value)?)
}

/// Read a repository; a missing or inaccessible one becomes `None`.
pub async fn read_repo(
    transport: &dyn Transport,
    config: &ClientConfig,
    owner: &str,
    repo: &str,
) -> Result<Option<Repository>> {
    let url = config.api_url(&format!("repos/{}/{}", owner, repo));
    match transport.get(&url, config).await {
        Ok(value) => Ok(Some(serde_json::from_value(value)?)),
        Err(err) => {
            tracing::debug!(owner = %owner, repo = %repo, error = %err, "read_repo failed");
            Ok(None)
        }
    }
}

/// Update repository settings; `None` when the update did not go through.
pub async fn update_repo(
    transport: &dyn Transport,
    config: &ClientConfig,
    owner: &str,
    repo: &str,
    patch: &RepoPatch,
) -> Result<Option<Repository>> {
    let url = config.api_url(&format!("repos/{}/{}", owner, repo));
    let payload = serde_json::to_value(patch)?;
    match transport.patch(&url, &payload, config).await {
        Ok(value) => Ok(Some(serde_json::from_value(value)?)),
        Err(err) => {
            tracing::debug!(owner = %owner, repo = %repo, error = %err, "update_repo failed");
            Ok(None)
        }
    }
}

/// Delete a repository; `None` when the delete did not go through.
pub async fn delete_repo(
    transport: &dyn Transport,
    config: &ClientConfig,
    owner: &str,
    repo: &str,
) -> Result<Option<Value>> {
    let url = config.api_url(&format!("repos/{}/{}", owner, repo));
    match transport.delete(&url, None, config).await {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::debug!(owner = %owner, repo = %repo, error = %err, "delete_repo failed");
            Ok(None)
        }
    }
}

/// Search repositories, scoped to `owner` when that user resolves.
///
/// Owner lookup failures degrade to an unscoped search rather than erroring,
/// so a typo in the owner field still returns something useful.
pub async fn search_repos(
    transport: &dyn Transport,
    config: &ClientConfig,
    owner: &str,
    query: &str,
) -> Result<Vec<Repository>> {
    let uid = if owner.is_empty() {
        0
    } else {
        match users::get_user(transport, config, owner).await? {
            Some(user) => user.id,
            None => {
                tracing::warn!(owner = %owner, "owner not found, searching unscoped");
                0
            }
        }
    };

    let mut path = format!("repos/search?q={}&limit={}", query, SEARCH_LIMIT);
    if uid != 0 {
        path.push_str(&format!("&uid={}", uid));
    }
    let url = config.api_url(&path);
    let value = transport.get(&url, config).await?;
    let results: SearchResults = serde_json::from_value(value)?;
    if !results.ok {
        return Err(Error::Decode("search response not ok".to_string()));
    }
    Ok(results.data)
}
