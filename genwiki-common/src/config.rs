//! Configuration file resolution, loading and atomic writing
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `GENWIKI_CONFIG` environment variable
//! 3. Per-user config directory (`~/.config/genwiki/<module>.toml`)
//!
//! A missing config file is never fatal: the loader logs a warning and the
//! caller continues with compiled defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "GENWIKI_CONFIG";

/// Directory name used below the platform config/data directories
const APP_DIR: &str = "genwiki";

/// Logging section shared by every GenWiki config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set (e.g. "info", "genwiki_locator=debug")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Resolves which config file a module should read
#[derive(Debug, Clone)]
pub struct ConfigFileResolver {
    module_name: String,
}

impl ConfigFileResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
        }
    }

    /// Resolve the config file path.
    ///
    /// Returns `None` only when no CLI argument or environment override is
    /// given and the platform has no config directory.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_path(&self.module_name)
    }
}

/// Per-user config file location for a module
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(format!("{}.toml", module_name)))
}

/// OS-dependent default data folder (`~/.local/share/genwiki` on Linux)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./genwiki_data"))
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Load a TOML config file, falling back to defaults when it does not exist.
///
/// A file that exists but cannot be read or parsed is an error.
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        warn!("No config file location available, using compiled defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using compiled defaults"
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)?;
    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Write a config atomically (temp file + rename).
///
/// On Unix the file is restricted to owner read/write (0600).
pub fn write_toml_config<T: Serialize>(config: &T, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Not a file path: {}", path.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&temp_path, path)?;
    Ok(())
}
