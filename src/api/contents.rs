//! Contents API: read, create, update, and delete files in a repository.
//!
//! File bodies cross the wire base64-encoded. The forge wraps encoded content
//! at 60 columns, so decoding strips whitespace first.

use crate::error::{Error, Result};
use crate::http::{ClientConfig, Transport};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// File record from the contents endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentsFile {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub encoding: Option<String>,
    /// Base64 body, present on reads, absent in listing entries
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl ContentsFile {
    /// Decode the base64 body to UTF-8 text.
    pub fn decoded(&self) -> Result<String> {
        match &self.content {
            Some(encoded) => decode_base64(encoded),
            None => Err(Error::Decode(format!("no content on '{}'", self.path))),
        }
    }
}

/// Commit created by a contents write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope returned by contents writes; `content` is absent after a delete
#[derive(Debug, Clone, Deserialize)]
pub struct ContentsResponse {
    #[serde(default)]
    pub content: Option<ContentsFile>,
    #[serde(default)]
    pub commit: Option<CommitInfo>,
}

fn decode_base64(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::Decode(format!("base64: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Decode(format!("utf-8: {}", e)))
}

fn contents_url(config: &ClientConfig, owner: &str, repo: &str, filepath: &str) -> String {
    config.api_url(&format!(
        "repos/{}/{}/contents/{}",
        owner,
        repo,
        filepath.trim_start_matches('/')
    ))
}

/// Read a file; a missing or inaccessible one becomes `None`.
pub async fn read_content(
    transport: &dyn Transport,
    config: &ClientConfig,
    owner: &str,
    repo: &str,
    filepath: &str,
    reference: Option<&str>,
) -> Result<Option<ContentsFile>> {
    let mut url = contents_url(config, owner, repo, filepath);
    if let Some(reference) = reference {
        url.push_str(&format!("?ref={}", reference));
    }
    match transport.get(&url, config).await {
        Ok(value) => Ok(Some(serde_json::from_value(value)?)),
        Err(err) => {
            tracing::debug!(filepath = %filepath, error = %err, "read_content failed");
            Ok(None)
        }
    }
}

/// Create a file on `branch` with a first commit.
pub async fn create_content(
    transport: &dyn Transport,
    config: &ClientConfig,
    owner: &str,
    repo: &str,
    filepath: &str,
    content: &str,
    branch: &str,
    message: &str,
) -> Result<ContentsResponse> {
    let url = contents_url(config, owner, repo, filepath);
    let payload = json!({
        "content": STANDARD.encode(content),
        "branch": branch,
        "message": message,
    });
    let value = transport.post(&url, &payload, config).await?;
    Ok(serde_json::from_value(value)?)
}

/// Replace a file's content. `sha` must match the blob being replaced.
pub async fn update_content(
    transport: &dyn Transport,
    config: &ClientConfig,
    owner: &str,
    repo: &str,
    filepath: &str,
    content: &str,
    sha: &str,
    branch: &str,
    message: &str,
) -> Result<ContentsResponse> {
    let url = contents_url(config, owner, repo, filepath);
    let payload = json!({
        "content": STANDARD.encode(content),
        "sha": sha,
        "branch": branch,
        "message": message,
    });
    let value = transport.put(&url, &payload, config).await?;
    Ok(serde_json::from_value(value)?)
}

/// Delete a file. `sha` must match the blob being removed.
pub async fn delete_content(
    transport: &dyn Transport,
    config: &ClientConfig,
    owner: &str,
    repo: &str,
    filepath: &str,
    sha: &str,
    branch: &str,
    message: &str,
) -> Result<ContentsResponse> {
    let url = contents_url(config, owner, repo, filepath);
    let payload = json!({
        "sha": sha,
        "branch": branch,
        "message": message,
    });
    let value = transport.delete(&url, Some(&payload), config).await?;
    Ok(serde_json::from_value(value)?)
}
