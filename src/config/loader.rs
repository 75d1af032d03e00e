use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error};

use crate::config::types::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file \"{}\": {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file \"{}\": {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file \"{}\": {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A configuration together with the file it came from (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: Option<PathBuf>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    const CONFIG_FILE: &'static str = "apiprobe.toml";

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the explicit `path`, or discover a config file, or fall back to defaults.
    ///
    /// Discovery order:
    /// 1. current directory and its parents
    /// 2. user config directory `~/.config/apiprobe/`
    pub fn load(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        if let Some(path) = path {
            return Ok(LoadedConfig {
                config: Self::load_from_path(path)?,
                path: Some(path.to_path_buf()),
            });
        }

        match Self::find() {
            Some(found) => {
                debug!("Using config file \"{}\"", found.display());
                Ok(LoadedConfig {
                    config: Self::load_from_path(&found)?,
                    path: Some(found),
                })
            }
            None => {
                debug!("No config file found, using defaults");
                Ok(LoadedConfig {
                    config: Config::default(),
                    path: None,
                })
            }
        }
    }

    /// Locate the config file without loading it.
    pub fn find() -> Option<PathBuf> {
        Self::find_from_current_dir().or_else(Self::find_in_user_dir)
    }

    fn find_from_current_dir() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(Self::CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    fn find_in_user_dir() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        let config_path = home.join(".config").join("apiprobe").join(Self::CONFIG_FILE);
        config_path.exists().then_some(config_path)
    }

    /// Write `config` back to `path`, replacing its content.
    pub fn save<P: AsRef<Path>>(config: &Config, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(config)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }

        fs::write(path, content).map_err(|source| {
            error!("Failed to write config file \"{}\". Error: {}", path.display(), source);
            ConfigError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}
