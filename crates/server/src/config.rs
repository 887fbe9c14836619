//! Server configuration.
//!
//! Loaded from TOML. Every key is optional; missing keys keep their defaults.
//!
//! ```toml
//! max_name_len = 32
//!
//! [catalog]
//! axe_radius = 0.14
//! head_radius = 0.25
//! ```

use std::path::Path;

use duelist_sim::{CatalogError, CatalogTuning, WeaponCatalog};
use serde::Deserialize;

/// Default cap on the stored client name.
pub const MAX_NAME_LEN: usize = 64;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Weapon and head radii.
    pub catalog: CatalogTuning,
    /// Client names are truncated to this many characters.
    pub max_name_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogTuning::default(),
            max_name_len: MAX_NAME_LEN,
        }
    }
}

impl ServerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.catalog.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Weapon catalog described by this configuration.
    pub fn weapon_catalog(&self) -> Result<WeaponCatalog, ConfigError> {
        Ok(WeaponCatalog::new(&self.catalog)?)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
}
