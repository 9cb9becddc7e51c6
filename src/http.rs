//! Forge API Transport
//!
//! Unified interface for talking to a Gitea-compatible forge over HTTP. The
//! `Transport` trait is the seam between the typed API layer and the wire:
//! production code uses `RestTransport` (reqwest), tests script responses
//! through a mock. Payloads cross the seam as `serde_json::Value`; the typed
//! wrappers in `api` deserialize on their side.

use crate::error::{Error, TransportError};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Connection settings shared by every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Forge base URL, e.g. `https://try.gitea.io`
    pub server: String,
    /// API prefix under the server root
    #[serde(default = "default_api_path")]
    pub api_path: String,
    /// Application token installed after login
    #[serde(default)]
    pub token: Option<String>,
    /// Extra headers applied to every request
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Bypass the in-memory GET cache
    #[serde(default)]
    pub no_cache: bool,
}

fn default_api_path() -> String {
    "api/v1".to_string()
}

impl ClientConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            api_path: default_api_path(),
            token: None,
            headers: Vec::new(),
            no_cache: false,
        }
    }

    /// Build a full URL for an API path, e.g. `repos/search` ->
    /// `https://host/api/v1/repos/search`.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.server.trim_end_matches('/'),
            self.api_path.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Resolve a possibly-relative URL against the server root. Absolute URLs
    /// (as returned in tree listings) pass through untouched.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.server.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }
}

/// HTTP verbs against the forge API
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a URL, returning the parsed JSON body
    async fn get(&self, url: &str, config: &ClientConfig) -> Result<Value, Error>;

    /// POST a JSON payload
    async fn post(&self, url: &str, payload: &Value, config: &ClientConfig)
        -> Result<Value, Error>;

    /// PUT a JSON payload
    async fn put(&self, url: &str, payload: &Value, config: &ClientConfig) -> Result<Value, Error>;

    /// PATCH a JSON payload
    async fn patch(
        &self,
        url: &str,
        payload: &Value,
        config: &ClientConfig,
    ) -> Result<Value, Error>;

    /// DELETE a URL; some endpoints require a JSON body (contents API)
    async fn delete(
        &self,
        url: &str,
        payload: Option<&Value>,
        config: &ClientConfig,
    ) -> Result<Value, Error>;
}

// Helper function to map reqwest errors to crate errors
fn map_http_error(error: reqwest::Error) -> Error {
    if error.is_status() {
        if let Some(status) = error.status() {
            return map_status_error(status.as_u16(), error.to_string());
        }
        Error::Transport(TransportError::Request(error.to_string()))
    } else if error.is_timeout() {
        Error::Transport(TransportError::Timeout(error.to_string()))
    } else if error.is_connect() {
        Error::Transport(TransportError::Connect(error.to_string()))
    } else {
        Error::Transport(TransportError::Request(error.to_string()))
    }
}

// Helper function to map non-2xx statuses to crate errors
fn map_status_error(code: u16, message: String) -> Error {
    match code {
        401 => Error::AuthFailed(message),
        403 => Error::PermissionDenied(message),
        404 => Error::NotFound(message),
        429 => Error::RateLimited(message),
        _ => Error::Transport(TransportError::Status { code, message }),
    }
}

const FORGE_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const FORGE_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_forge_http_client() -> Result<Client, Error> {
    Client::builder()
        .no_proxy()
        .connect_timeout(FORGE_HTTP_CONNECT_TIMEOUT)
        .timeout(FORGE_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| Error::Transport(TransportError::Request(format!(
            "Failed to create HTTP client: {}",
            e
        ))))
}

/// Production transport over reqwest with a URL-keyed GET cache
pub struct RestTransport {
    client: Client,
    cache: RwLock<HashMap<String, Value>>,
}

impl RestTransport {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            client: build_forge_http_client()?,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Drop all cached GET responses.
    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    fn apply_headers(
        &self,
        mut request: reqwest::RequestBuilder,
        config: &ClientConfig,
    ) -> reqwest::RequestBuilder {
        // An explicit Authorization header (basic-auth flows) overrides the
        // stored token.
        let has_authorization = config
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("authorization"));
        if !has_authorization {
            if let Some(token) = &config.token {
                request = request.header("Authorization", format!("token {}", token));
            }
        }
        for (name, value) in &config.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<Value, Error> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status_error(status.as_u16(), error_text));
        }

        // 204s and some DELETEs come back bodyless
        let text = response.text().await.map_err(map_http_error)?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| Error::Decode(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Transport for RestTransport {
    async fn get(&self, url: &str, config: &ClientConfig) -> Result<Value, Error> {
        if !config.no_cache {
            if let Some(cached) = self.cache.read().get(url) {
                tracing::debug!(url = %url, "GET served from cache");
                return Ok(cached.clone());
            }
        }

        let request = self.apply_headers(self.client.get(url), config);
        let response = request.send().await.map_err(map_http_error)?;
        let value = self.handle_response(response).await?;

        if !config.no_cache {
            self.cache.write().insert(url.to_string(), value.clone());
        }
        Ok(value)
    }

    async fn post(
        &self,
        url: &str,
        payload: &Value,
        config: &ClientConfig,
    ) -> Result<Value, Error> {
        let request = self
            .apply_headers(self.client.post(url), config)
            .header("Content-Type", "application/json")
            .json(payload);
        let response = request.send().await.map_err(map_http_error)?;
        let value = self.handle_response(response).await?;
        // Writes invalidate all cached reads
        self.clear_cache();
        Ok(value)
    }

    async fn put(&self, url: &str, payload: &Value, config: &ClientConfig) -> Result<Value, Error> {
        let request = self
            .apply_headers(self.client.put(url), config)
            .header("Content-Type", "application/json")
            .json(payload);
        let response = request.send().await.map_err(map_http_error)?;
        let value = self.handle_response(response).await?;
        self.clear_cache();
        Ok(value)
    }

    async fn patch(
        &self,
        url: &str,
        payload: &Value,
        config: &ClientConfig,
    ) -> Result<Value, Error> {
        let request = self
            .apply_headers(self.client.patch(url), config)
            .header("Content-Type", "application/json")
            .json(payload);
        let response = request.send().await.map_err(map_http_error)?;
        let value = self.handle_response(response).await?;
        self.clear_cache();
        Ok(value)
    }

    async fn delete(
        &self,
        url: &str,
        payload: Option<&Value>,
        config: &ClientConfig,
    ) -> Result<Value, Error> {
        let mut request = self.apply_headers(self.client.delete(url), config);
        if let Some(payload) = payload {
            request = request
                .header("Content-Type", "application/json")
                .json(payload);
        }
        let response = request.send().await.map_err(map_http_error)?;
        let value = self.handle_response(response).await?;
        self.clear_cache();
        Ok(value)
    }
}

/// Scripted transport for exercising state machines without a server.
#[cfg(test)]
pub struct MockTransport {
    scripts: parking_lot::Mutex<HashMap<String, std::collections::VecDeque<Result<Value, Error>>>>,
    calls: parking_lot::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            scripts: parking_lot::Mutex::new(HashMap::new()),
            calls: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Queue a response for `method url`; responses pop in FIFO order.
    pub fn script(&self, method: &str, url: &str, response: Result<Value, Error>) {
        self.scripts
            .lock()
            .entry(format!("{} {}", method, url))
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, method: &str, url: &str) -> usize {
        let key = format!("{} {}", method, url);
        self.calls.lock().iter().filter(|c| **c == key).count()
    }

    fn take(&self, method: &str, url: &str) -> Result<Value, Error> {
        let key = format!("{} {}", method, url);
        self.calls.lock().push(key.clone());
        self.scripts
            .lock()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(Error::NotFound(format!("no scripted response for {}", key))))
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, _config: &ClientConfig) -> Result<Value, Error> {
        self.take("GET", url)
    }

    async fn post(
        &self,
        url: &str,
        _payload: &Value,
        _config: &ClientConfig,
    ) -> Result<Value, Error> {
        self.take("POST", url)
    }

    async fn put(
        &self,
        url: &str,
        _payload: &Value,
        _config: &ClientConfig,
    ) -> Result<Value, Error> {
        self.take("PUT", url)
    }

    async fn patch(
        &self,
        url: &str,
        _payload: &Value,
        _config: &ClientConfig,
    ) -> Result<Value, Error> {
        self.take("PATCH", url)
    }

    async fn delete(
        &self,
        url: &str,
        _payload: Option<&Value>,
        _config: &ClientConfig,
    ) -> Result<Value, Error> {
        self.take("DELETE", url)
    }
}
