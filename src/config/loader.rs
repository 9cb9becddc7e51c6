//! Configuration loading: defaults, global file, workspace file, environment.

use super::ForgeSettings;
use crate::error::Error;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings for a workspace, lowest precedence first: defaults,
    /// the global file, `forgekit.toml` in the workspace, `FORGEKIT_*` env.
    pub fn load(workspace_root: &Path) -> Result<ForgeSettings, Error> {
        let mut builder = builder_with_defaults()?;
        builder = add_global_file(builder)?;
        builder = add_workspace_file(builder, workspace_root)?;
        builder = builder.add_source(
            Environment::with_prefix("FORGEKIT")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Load settings from one explicit file, skipping the hierarchy.
    pub fn load_from_file(path: &Path) -> Result<ForgeSettings, Error> {
        let settings = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Path to the global config file, `~/.config/forgekit/config.toml`.
    pub fn global_config_path() -> Option<PathBuf> {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("forgekit")
                .join("config.toml")
        })
    }
}

/// Create a Config builder with defaults applied.
fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, Error> {
    let builder = Config::builder()
        .set_default("server", "https://try.gitea.io")?
        .set_default("api_path", "api/v1")?
        .set_default("tokenid", "forgekit")?;
    Ok(builder)
}

/// Add the global config file source to the builder if it exists.
fn add_global_file(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, Error> {
    if let Some(global_path) = ConfigLoader::global_config_path() {
        if global_path.exists() {
            builder = builder.add_source(File::from(global_path).required(false));
        } else {
            warn!(
                config_path = %global_path.display(),
                "Global configuration file not found. Consider creating it for user-level defaults."
            );
        }
    }
    Ok(builder)
}

/// Add the workspace `forgekit.toml` source to the builder if it exists.
fn add_workspace_file(
    mut builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, Error> {
    let workspace_path = workspace_root.join("forgekit.toml");
    if workspace_path.exists() {
        builder = builder.add_source(File::from(workspace_path).required(false));
    }
    Ok(builder)
}
