//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::context::{ConfigurationContext, ConfigurationError};
use crate::config::schema::{KeypairFile, Keypairs, Settings};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Context(#[from] ConfigurationError),
}

/// Locations of the settings files. Every file is optional.
#[derive(Debug, Clone, Default)]
pub struct SettingsPaths {
    /// Deployment-global settings.
    pub global: Option<PathBuf>,
    /// Process-specific overrides.
    pub process: Option<PathBuf>,
    /// Credential keypairs.
    pub keypairs: Option<PathBuf>,
}

/// Load a settings table from a TOML file.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = read(path)?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a keypair file (`[keypairs.<provider>]` tables).
pub fn load_keypairs(path: &Path) -> Result<Keypairs, ConfigError> {
    let content = read(path)?;
    let file: KeypairFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.keypairs)
}

/// Load every configured file and build the configuration context.
pub fn load_context(paths: &SettingsPaths) -> Result<ConfigurationContext, ConfigError> {
    let global = match &paths.global {
        Some(path) => load_settings(path)?,
        None => Settings::new(),
    };
    let process = match &paths.process {
        Some(path) => load_settings(path)?,
        None => Settings::new(),
    };
    let keypairs = match &paths.keypairs {
        Some(path) => load_keypairs(path)?,
        None => Keypairs::new(),
    };

    tracing::info!(
        global = ?paths.global,
        process = ?paths.process,
        keypairs = keypairs.len(),
        "Settings loaded"
    );

    Ok(ConfigurationContext::new(global, process, keypairs)?)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
