//! Session authentication against the forge.
//!
//! Login is a two-step dance: token management endpoints only accept basic
//! auth, so `AuthSession::login` first talks to the forge with an
//! `Authorization: Basic` header to ensure the application token, then
//! installs that token on the `ClientConfig` for everything after. The
//! resulting `Authentication` can be persisted behind the `AuthStorage`
//! trait so later runs skip the password prompt.

pub mod storage;

pub use storage::{AuthStorage, XdgAuthStorage};

use crate::api::{users, Token, User};
use crate::api::tokens::ensure_token;
use crate::error::{Error, Result};
use crate::http::{ClientConfig, Transport};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Header pair for HTTP basic auth.
pub fn authorization_headers(username: &str, password: &str) -> Vec<(String, String)> {
    let credentials = STANDARD.encode(format!("{}:{}", username, password));
    vec![("Authorization".to_string(), format!("Basic {}", credentials))]
}

/// Header pair carrying an application token secret.
pub fn token_headers(sha1: &str) -> Vec<(String, String)> {
    vec![("Authorization".to_string(), format!("token {}", sha1))]
}

/// A copy of `config` that authenticates with basic auth instead of the
/// stored token. Token endpoints require this.
pub fn basic_config(config: &ClientConfig, username: &str, password: &str) -> ClientConfig {
    config
        .clone()
        .with_headers(authorization_headers(username, password))
}

/// What the login form collects
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Persist the session for later runs
    pub remember: bool,
}

/// A completed login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authentication {
    pub user: User,
    pub token: Token,
    #[serde(default)]
    pub remember: bool,
}

/// Login/logout state machine around an `AuthStorage`.
pub struct AuthSession {
    storage: Arc<dyn AuthStorage>,
    /// Name of the application token to ensure on the forge
    token_name: String,
    authentication: Option<Authentication>,
}

impl AuthSession {
    pub fn new(storage: Arc<dyn AuthStorage>, token_name: impl Into<String>) -> Self {
        Self {
            storage,
            token_name: token_name.into(),
            authentication: None,
        }
    }

    pub fn authentication(&self) -> Option<&Authentication> {
        self.authentication.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.authentication.as_ref().map(|a| &a.user)
    }

    /// Rehydrate a remembered session and install its token on `config`.
    /// Nothing stored, or a stored token without its secret, restores nothing.
    pub fn restore(&mut self, config: &mut ClientConfig) -> Result<Option<&Authentication>> {
        if let Some(stored) = self.storage.load()? {
            if let Some(sha1) = stored.token.sha1.clone() {
                config.token = Some(sha1);
                self.authentication = Some(stored);
                return Ok(self.authentication.as_ref());
            }
            tracing::warn!("stored session has no token secret, ignoring it");
        }
        Ok(None)
    }

    /// Authenticate with username/password.
    ///
    /// Ensures the application token under basic auth (reusing a remembered
    /// secret for the same user when one exists), installs it on `config`,
    /// and fetches the user record with it. With `remember` set the session
    /// is written through the storage; without it any stored session for
    /// this machine is dropped.
    pub async fn login(
        &mut self,
        transport: &dyn Transport,
        config: &mut ClientConfig,
        credentials: Credentials,
    ) -> Result<&Authentication> {
        let basic = basic_config(config, &credentials.username, &credentials.password);

        let stored_sha1 = self
            .storage
            .load()?
            .filter(|stored| stored.user.username == credentials.username)
            .and_then(|stored| stored.token.sha1);

        let token = ensure_token(
            transport,
            &basic,
            &credentials.username,
            &self.token_name,
            stored_sha1.as_deref(),
        )
        .await?;

        let sha1 = token
            .sha1
            .clone()
            .ok_or_else(|| Error::AuthFailed("token created without a secret".to_string()))?;
        config.token = Some(sha1);

        let user = users::current_user(transport, config).await?;
        tracing::info!(username = %user.username, "logged in");

        let authentication = Authentication {
            user,
            token,
            remember: credentials.remember,
        };
        if credentials.remember {
            self.storage.save(&authentication)?;
        } else {
            self.storage.forget()?;
        }

        Ok(self.authentication.insert(authentication))
    }

    /// Drop the session: clears the installed token and forgets any stored
    /// authentication. The token itself stays registered on the forge.
    pub fn logout(&mut self, config: &mut ClientConfig) -> Result<()> {
        if let Some(auth) = &self.authentication {
            tracing::info!(username = %auth.user.username, "logged out");
        }
        self.authentication = None;
        config.token = None;
        self.storage.forget()
    }
}

static FORM_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Headless login form state.
///
/// Field ids are deterministic per form instance (a monotonic counter), so
/// two forms on one screen never collide and renders stay stable.
#[derive(Debug)]
pub struct LoginForm {
    instance: u64,
    pub username: String,
    pub password: String,
    pub remember: bool,
    busy: bool,
    error: Option<String>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            instance: FORM_COUNTER.fetch_add(1, Ordering::Relaxed),
            username: String::new(),
            password: String::new(),
            remember: false,
            busy: false,
            error: None,
        }
    }

    /// Stable id for a named field, e.g. `username-0`.
    pub fn field_id(&self, field: &str) -> String {
        format!("{}-{}", field, self.instance)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Snapshot the form into credentials and mark it busy. Refuses while a
    /// prior submit is still in flight or a field is empty.
    pub fn submit(&mut self) -> Result<Credentials> {
        if self.busy {
            return Err(Error::AuthFailed("login already in progress".to_string()));
        }
        if self.username.is_empty() || self.password.is_empty() {
            self.error = Some("username and password are required".to_string());
            return Err(Error::AuthFailed(
                "username and password are required".to_string(),
            ));
        }
        self.busy = true;
        self.error = None;
        Ok(Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            remember: self.remember,
        })
    }

    /// Report the submit outcome back to the form.
    pub fn finish(&mut self, outcome: Result<()>) {
        self.busy = false;
        if let Err(err) = outcome {
            self.error = Some(err.to_string());
            self.password.clear();
        }
    }
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}
