use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;
use url::Url;

use crate::cache::validate_generation;
use crate::view::grid::BoundaryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schedule id shown on startup; falls back to the first schedule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_schedule: Option<String>,
    /// Published schedule files merged into the built-in set.
    pub schedule_urls: Vec<Url>,
    /// Bump to drop every cached copy of `schedule_urls`.
    pub cache_generation: String,
    pub boundary_policy: BoundaryPolicy,
    /// `#rrggbb` course colors; empty means the built-in pastels.
    pub palette: Vec<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_schedule: None,
            schedule_urls: Vec::new(),
            cache_generation: "v1".into(),
            boundary_policy: BoundaryPolicy::StartTimes,
            palette: Vec::new(),
            log_level: "info".into(),
        }
    }
}

impl Config {
    /// Reads the config file if there is one; otherwise defaults.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config at {}", path.display()))?;
                Self::parse(&contents)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "Failed to parse config.toml")?;
        validate_generation(&config.cache_generation)?;
        config.palette_colors()?;
        config.log_level()?;
        Ok(config)
    }

    pub fn generate_default() -> Result<PathBuf> {
        let path = Self::config_path()
            .with_context(|| "Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(&Config::default())?;
        std::fs::write(&path, toml_str)?;
        Ok(path)
    }

    pub fn palette_colors(&self) -> Result<Vec<Color>> {
        self.palette
            .iter()
            .map(|hex| {
                hex.parse::<Color>()
                    .map_err(|_| anyhow::anyhow!("Invalid palette color {hex:?}"))
            })
            .collect()
    }

    pub fn log_level(&self) -> Result<Level> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid log_level {:?}", self.log_level))
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("class-schedule").join("config.toml"))
    }
}
