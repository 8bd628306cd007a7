//! Configuration handling for the config generator
//!
//! Naming constants (template, tenant, crypto profiles, domain) and the
//! generation mode are resolved once per run and handed to the assembler.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// File name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "prisma-rn.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub naming: NamingConfig,
    pub generation: GenerationConfig,
}

/// Names substituted verbatim into every generated statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub template: String,
    pub tenant: String,
    pub ike_crypto_profile: String,
    pub ipsec_crypto_profile: String,
    /// Suffix for peer identities, e.g. `b351-primary.<domain>`
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Emit blocks in the backup-capable layout
    ///
    /// When false, blocks use the single-tunnel layout and any backup
    /// request on an input is ignored.
    pub backup_support: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            template: "rn-tpl-fbm".to_string(),
            tenant: "fbm".to_string(),
            ike_crypto_profile: "velocloud-ike-crypto-primary".to_string(),
            ipsec_crypto_profile: "velocloud-ipsec-crypto-default".to_string(),
            domain: "fbmsales.com".to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backup_support: true,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load config from an explicit path or the default locations
    ///
    /// Lookup order: `explicit`, `./prisma-rn.toml`,
    /// `~/.prisma-rn/config.toml`, then built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!("Loading config from {}", path.display());
            return Self::load(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            info!("Loading config from {}", local_config.display());
            return Self::load(&local_config);
        }

        if let Some(home_config) = home_config_path() {
            if home_config.exists() {
                info!("Loading config from {}", home_config.display());
                return Self::load(&home_config);
            }
        }

        info!("No config file found, using defaults");
        Ok(Config::default())
    }
}

/// `~/.prisma-rn/config.toml`, if a home directory is known
pub fn home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".prisma-rn").join("config.toml"))
}
