//! Shared fixtures: a scripted transport that records requests, an in-memory
//! session store, and canned forge payloads.

use async_trait::async_trait;
use forgekit::auth::{AuthStorage, Authentication};
use forgekit::error::{Error, Result};
use forgekit::http::{ClientConfig, Transport};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};

pub const SERVER: &str = "https://git.example.com";

pub fn client_config() -> ClientConfig {
    ClientConfig::new(SERVER)
}

/// One observed request: method and url, the JSON payload if any, and the
/// credentials the client config carried at call time.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub key: String,
    pub payload: Option<Value>,
    pub token: Option<String>,
    pub headers: Vec<(String, String)>,
}

/// Scripted transport for full-flow tests. Responses queue per `METHOD url`
/// key and pop in FIFO order; every request is recorded for assertion.
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn script(&self, method: &str, url: &str, response: Result<Value>) {
        self.scripts
            .lock()
            .entry(format!("{} {}", method, url))
            .or_default()
            .push_back(response);
    }

    pub fn call_count(&self, method: &str, url: &str) -> usize {
        let key = format!("{} {}", method, url);
        self.calls.lock().iter().filter(|c| c.key == key).count()
    }

    /// Most recent recorded request for `METHOD url`.
    pub fn last_call(&self, method: &str, url: &str) -> Option<RecordedCall> {
        let key = format!("{} {}", method, url);
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|c| c.key == key)
            .cloned()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    fn take(
        &self,
        method: &str,
        url: &str,
        payload: Option<&Value>,
        config: &ClientConfig,
    ) -> Result<Value> {
        let key = format!("{} {}", method, url);
        self.calls.lock().push(RecordedCall {
            key: key.clone(),
            payload: payload.cloned(),
            token: config.token.clone(),
            headers: config.headers.clone(),
        });
        self.scripts
            .lock()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(Error::NotFound(format!("no scripted response for {}", key))))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, config: &ClientConfig) -> Result<Value> {
        self.take("GET", url, None, config)
    }

    async fn post(&self, url: &str, payload: &Value, config: &ClientConfig) -> Result<Value> {
        self.take("POST", url, Some(payload), config)
    }

    async fn put(&self, url: &str, payload: &Value, config: &ClientConfig) -> Result<Value> {
        self.take("PUT", url, Some(payload), config)
    }

    async fn patch(&self, url: &str, payload: &Value, config: &ClientConfig) -> Result<Value> {
        self.take("PATCH", url, Some(payload), config)
    }

    async fn delete(
        &self,
        url: &str,
        payload: Option<&Value>,
        config: &ClientConfig,
    ) -> Result<Value> {
        self.take("DELETE", url, payload, config)
    }
}

/// Session store backed by a mutex, for flows that should not touch XDG.
pub struct MemoryStorage {
    stored: Mutex<Option<Authentication>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            stored: Mutex::new(None),
        }
    }

    pub fn stored(&self) -> Option<Authentication> {
        self.stored.lock().clone()
    }
}

impl AuthStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Authentication>> {
        Ok(self.stored.lock().clone())
    }

    fn save(&self, authentication: &Authentication) -> Result<()> {
        *self.stored.lock() = Some(authentication.clone());
        Ok(())
    }

    fn forget(&self) -> Result<()> {
        *self.stored.lock() = None;
        Ok(())
    }
}

pub fn user_json(id: i64, username: &str) -> Value {
    json!({
        "id": id,
        "login": username,
        "full_name": "",
        "email": format!("{}@example.com", username),
    })
}

pub fn repository_json(owner: &str, name: &str, branch: &str, push: bool) -> Value {
    json!({
        "id": 42,
        "name": name,
        "full_name": format!("{}/{}", owner, name),
        "description": "test repository",
        "default_branch": branch,
        "private": false,
        "fork": false,
        "owner": {"id": 7, "login": owner},
        "permissions": {"admin": push, "push": push, "pull": true},
    })
}

/// One-level git trees page.
pub fn tree_page(sha: &str, rows: Value) -> Value {
    json!({"sha": sha, "tree": rows, "truncated": false})
}

pub fn dir_row(path: &str, url: &str) -> Value {
    json!({"path": path, "type": "tree", "sha": format!("sha-{}", path), "url": url})
}

pub fn blob_row(path: &str, sha: &str) -> Value {
    json!({"path": path, "type": "blob", "sha": sha, "size": 64})
}
