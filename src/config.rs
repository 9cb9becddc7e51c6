//! Configuration System
//!
//! Hierarchical configuration with environment variable overrides and
//! runtime validation. Precedence, lowest to highest: built-in defaults,
//! the global file under `~/.config/forgekit/`, a `forgekit.toml` at the
//! workspace root, then `FORGEKIT_*` environment variables.

use crate::http::ClientConfig;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

mod loader;

pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeSettings {
    /// Forge base URL, e.g. `https://try.gitea.io`
    #[serde(default = "default_server")]
    pub server: String,

    /// API prefix under the server root
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// Name of the application token to register on the forge
    #[serde(default = "default_tokenid")]
    pub tokenid: String,

    /// Default owner scope for repository searches (empty: search everywhere)
    #[serde(default)]
    pub owner: String,

    /// Disable the in-memory GET cache
    #[serde(default)]
    pub no_cache: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_server() -> String {
    "https://try.gitea.io".to_string()
}

fn default_api_path() -> String {
    "api/v1".to_string()
}

fn default_tokenid() -> String {
    "forgekit".to_string()
}

impl Default for ForgeSettings {
    fn default() -> Self {
        Self {
            server: default_server(),
            api_path: default_api_path(),
            tokenid: default_tokenid(),
            owner: String::new(),
            no_cache: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Server(String),
    Token(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Server(msg) => write!(f, "Server: {}", msg),
            ValidationError::Token(msg) => write!(f, "Token: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ForgeSettings {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.server.is_empty() {
            errors.push(ValidationError::Server(
                "server URL cannot be empty".to_string(),
            ));
        } else if !self.server.starts_with("http://") && !self.server.starts_with("https://") {
            errors.push(ValidationError::Server(format!(
                "server URL must start with http:// or https:// (got '{}')",
                self.server
            )));
        }

        if self.api_path.is_empty() {
            errors.push(ValidationError::Server(
                "api_path cannot be empty".to_string(),
            ));
        }

        if self.tokenid.is_empty() {
            errors.push(ValidationError::Token(
                "tokenid cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Connection settings for the transport layer.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            server: self.server.clone(),
            api_path: self.api_path.clone(),
            token: None,
            headers: Vec::new(),
            no_cache: self.no_cache,
        }
    }
}
