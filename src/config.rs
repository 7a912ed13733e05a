use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::path::{expand_path, get_default_store_dir};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the catalog collections
    #[serde(default = "get_default_store_dir")]
    pub store_path: PathBuf,
    /// Catalogs with fewer records are reported (0 disables the check)
    #[serde(default = "default_min_catalog_size")]
    pub min_catalog_size: usize,
    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_min_catalog_size() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: get_default_store_dir(),
            min_catalog_size: default_min_catalog_size(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let mut config: Config =
                toml::from_str(&content).with_context(|| "Failed to parse config file")?;

            if config.log_level.trim().is_empty() {
                config.log_level = default_log_level();
            }

            Ok(config)
        } else {
            let config = Self::default();
            config.save(config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Store directory with `~` expanded.
    pub fn store_dir(&self) -> PathBuf {
        expand_path(&self.store_path.to_string_lossy())
    }

    /// Update a setting by its TOML key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "store_path" => self.store_path = PathBuf::from(value),
            "min_catalog_size" => {
                self.min_catalog_size = value.trim().parse().with_context(|| {
                    format!("min_catalog_size must be a number, got '{}'", value)
                })?;
            }
            "log_level" => {
                tracing_subscriber::EnvFilter::try_new(value)
                    .with_context(|| format!("Invalid log level: '{}'", value))?;
                self.log_level = value.to_string();
            }
            other => bail!(
                "Unknown config key '{}' (expected store_path, min_catalog_size or log_level)",
                other
            ),
        }
        Ok(())
    }
}
