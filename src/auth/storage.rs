//! Persistence seam for remembered sessions.

use super::Authentication;
use crate::error::{Error, Result};
use std::path::PathBuf;

/// Where remembered sessions live. Implementations decide the medium; the
/// session logic only ever goes through this trait.
pub trait AuthStorage: Send + Sync {
    fn load(&self) -> Result<Option<Authentication>>;
    fn save(&self, authentication: &Authentication) -> Result<()>;
    fn forget(&self) -> Result<()>;
}

/// Stores the session as TOML under the XDG config directory.
pub struct XdgAuthStorage;

impl XdgAuthStorage {
    pub fn new() -> Self {
        Self
    }

    pub fn path(&self) -> Result<PathBuf> {
        Ok(auth_dir()?.join("auth.toml"))
    }
}

impl Default for XdgAuthStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn config_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let base = directories::BaseDirs::new()
        .ok_or_else(|| Error::Config("Cannot determine a config directory".to_string()))?;
    Ok(base.config_dir().to_path_buf())
}

fn auth_dir() -> Result<PathBuf> {
    let dir = config_home()?.join("forgekit");
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create config directory {}: {}",
                dir.display(),
                e
            ))
        })?;
    }
    Ok(dir)
}

impl AuthStorage for XdgAuthStorage {
    fn load(&self) -> Result<Option<Authentication>> {
        let path = self.path()?;
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Storage(format!("Failed to read session {}: {}", path.display(), e))
        })?;
        match toml::from_str(&content) {
            Ok(authentication) => Ok(Some(authentication)),
            Err(e) => {
                tracing::error!("Failed to parse stored session {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&self, authentication: &Authentication) -> Result<()> {
        let path = self.path()?;
        let toml_content = toml::to_string_pretty(authentication)
            .map_err(|e| Error::Storage(format!("Failed to serialize session: {}", e)))?;
        std::fs::write(&path, toml_content).map_err(|e| {
            Error::Storage(format!(
                "Failed to write session to {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(())
    }

    fn forget(&self) -> Result<()> {
        let path = self.path()?;
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                Error::Storage(format!(
                    "Failed to delete session {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and ephemeral sessions.
#[cfg(test)]
pub(crate) struct MemoryAuthStorage {
    stored: parking_lot::Mutex<Option<Authentication>>,
}

#[cfg(test)]
impl MemoryAuthStorage {
    pub fn new() -> Self {
        Self {
            stored: parking_lot::Mutex::new(None),
        }
    }
}

#[cfg(test)]
impl AuthStorage for MemoryAuthStorage {
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
