//! Persisted CLI defaults, loaded from `~/.config/xdump/config.toml`.
//!
//! Missing file yields defaults; `save()` creates parent directories as
//! needed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub output_root: Option<PathBuf>,
    pub workers: Option<usize>,
    pub per_type_cap: Option<usize>,
    #[serde(default)]
    pub convert: bool,
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(dir.join("xdump").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Loads from `override_path` when given, else the default
    /// `~/.config/xdump/config.toml` location (the CLI's `--config` flag).
    pub fn load_from(override_path: Option<&std::path::Path>) -> Result<Self> {
        let path = match override_path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(&path, raw).with_context(|| format!("failed to write {}", path.display()))
    }
}
