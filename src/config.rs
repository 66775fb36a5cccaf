use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::Friction;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_cadence_days")]
    pub default_cadence_days: u32,

    #[serde(default)]
    pub default_friction: Friction,

    #[serde(default = "default_skip_days")]
    pub default_skip_days: u32,

    #[serde(default = "default_recent_activity_limit")]
    pub recent_activity_limit: usize,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rhythm-keeper");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("rhythms.db").to_string_lossy().to_string()
}

fn default_cadence_days() -> u32 {
    14
}

fn default_skip_days() -> u32 {
    7
}

fn default_recent_activity_limit() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            default_cadence_days: default_cadence_days(),
            default_friction: Friction::default(),
            default_skip_days: default_skip_days(),
            recent_activity_limit: default_recent_activity_limit(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Reads the config at `path`, writing defaults there when the file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rhythm-keeper")
            .join("config.toml")
    }
}
